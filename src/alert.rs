//! Native error dialog for fatal startup failures
//!
//! Best effort only: a headless session or a broken dialog backend must not
//! turn an already fatal error into a crash with a worse message.

use rfd::{MessageButtons, MessageDialog, MessageLevel};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

pub const ALERT_TITLE: &str = "Controller Error";

pub fn show_alert(message: &str) {
    debug!("Showing alert: {}", message);
    let shown = panic::catch_unwind(AssertUnwindSafe(|| {
        MessageDialog::new()
            .set_level(MessageLevel::Error)
            .set_title(ALERT_TITLE)
            .set_description(message)
            .set_buttons(MessageButtons::Ok)
            .show()
    }));

    if shown.is_err() {
        warn!("Could not display alert dialog");
    }
}
