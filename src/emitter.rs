//! OS key injection
//!
//! [`KeyEmitter`] is fire-and-forget: platform failures are logged and never
//! reach the engine, which already deduplicates presses on its side.

use crate::mapping::LogicalKey;
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum EmitterError {
    #[error("Failed to connect to the input system: {0}")]
    InitializationError(String),
}

pub trait KeyEmitter {
    fn key_down(&mut self, key: LogicalKey);

    fn key_up(&mut self, key: LogicalKey);
}

/// Injects real key events through enigo
pub struct EnigoEmitter {
    enigo: Enigo,
}

impl EnigoEmitter {
    pub fn new() -> Result<Self, EmitterError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| EmitterError::InitializationError(e.to_string()))?;
        info!("Keyboard emitter connected");
        Ok(Self { enigo })
    }

    fn send(&mut self, key: LogicalKey, direction: Direction) {
        if let Err(e) = self.enigo.key(enigo_key(key), direction) {
            warn!("Failed to send {:?} for key '{}': {}", direction, key, e);
        }
    }
}

impl KeyEmitter for EnigoEmitter {
    fn key_down(&mut self, key: LogicalKey) {
        self.send(key, Direction::Press);
    }

    fn key_up(&mut self, key: LogicalKey) {
        self.send(key, Direction::Release);
    }
}

/// Dry-run emitter that only logs
#[derive(Debug, Default)]
pub struct TracingEmitter;

impl KeyEmitter for TracingEmitter {
    fn key_down(&mut self, key: LogicalKey) {
        info!("[dry run] key down: {}", key);
    }

    fn key_up(&mut self, key: LogicalKey) {
        info!("[dry run] key up: {}", key);
    }
}

fn enigo_key(key: LogicalKey) -> Key {
    let mapped = match key {
        LogicalKey::Shift => Key::Shift,
        LogicalKey::Space => Key::Space,
        LogicalKey::LeftCtrl => Key::Control,
        LogicalKey::X => Key::Unicode('x'),
        LogicalKey::Tab => Key::Tab,
        LogicalKey::K => Key::Unicode('k'),
        LogicalKey::Escape => Key::Escape,
        LogicalKey::Digit3 => Key::Unicode('3'),
        LogicalKey::Digit2 => Key::Unicode('2'),
        LogicalKey::Q => Key::Unicode('q'),
        LogicalKey::W => Key::Unicode('w'),
        LogicalKey::A => Key::Unicode('a'),
        LogicalKey::S => Key::Unicode('s'),
        LogicalKey::Up => Key::UpArrow,
        LogicalKey::Down => Key::DownArrow,
        LogicalKey::Left => Key::LeftArrow,
        LogicalKey::Right => Key::RightArrow,
    };
    debug!("Mapped '{}' to {:?}", key, mapped);
    mapped
}

#[cfg(test)]
pub(crate) mod testing {
    use super::KeyEmitter;
    use crate::mapping::LogicalKey;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Everything that happened at the platform boundary, in order
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Call {
        Down(LogicalKey),
        Up(LogicalKey),
        ControllerClosed,
    }

    pub type CallLog = Rc<RefCell<Vec<Call>>>;

    /// Records calls into a log shared with the test
    pub struct RecordingEmitter {
        log: CallLog,
    }

    impl RecordingEmitter {
        pub fn new() -> (Self, CallLog) {
            let log = CallLog::default();
            (Self { log: log.clone() }, log)
        }

        pub fn with_log(log: CallLog) -> Self {
            Self { log }
        }
    }

    impl KeyEmitter for RecordingEmitter {
        fn key_down(&mut self, key: LogicalKey) {
            self.log.borrow_mut().push(Call::Down(key));
        }

        fn key_up(&mut self, key: LogicalKey) {
            self.log.borrow_mut().push(Call::Up(key));
        }
    }

    /// Takes the recorded calls, leaving the log empty
    pub fn take(log: &CallLog) -> Vec<Call> {
        std::mem::take(&mut *log.borrow_mut())
    }
}
