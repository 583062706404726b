//! Point-in-time controller state and the sampler interface
//!
//! Buttons and axes use the standard gamepad index order, so a snapshot is two
//! fixed arrays indexed by [`PadButton`] and [`PadAxis`]. Stick axes are signed
//! 16-bit values where negative X points left and negative Y points up.
//! Triggers rest at 0 and go up to `i16::MAX`.

use std::fmt;

/// Physical controller button, discriminant is the standard gamepad index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PadButton {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    Back = 4,
    Guide = 5,
    Start = 6,
    LeftStick = 7,
    RightStick = 8,
    LeftShoulder = 9,
    RightShoulder = 10,
    DPadUp = 11,
    DPadDown = 12,
    DPadLeft = 13,
    DPadRight = 14,
}

impl PadButton {
    pub const COUNT: usize = 15;

    pub const ALL: [PadButton; PadButton::COUNT] = [
        PadButton::A,
        PadButton::B,
        PadButton::X,
        PadButton::Y,
        PadButton::Back,
        PadButton::Guide,
        PadButton::Start,
        PadButton::LeftStick,
        PadButton::RightStick,
        PadButton::LeftShoulder,
        PadButton::RightShoulder,
        PadButton::DPadUp,
        PadButton::DPadDown,
        PadButton::DPadLeft,
        PadButton::DPadRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_dpad(self) -> bool {
        matches!(
            self,
            PadButton::DPadUp | PadButton::DPadDown | PadButton::DPadLeft | PadButton::DPadRight
        )
    }
}

/// Analog axis, discriminant is the standard gamepad index
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PadAxis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
    TriggerLeft = 4,
    TriggerRight = 5,
}

impl PadAxis {
    pub const COUNT: usize = 6;

    pub const ALL: [PadAxis; PadAxis::COUNT] = [
        PadAxis::LeftX,
        PadAxis::LeftY,
        PadAxis::RightX,
        PadAxis::RightY,
        PadAxis::TriggerLeft,
        PadAxis::TriggerRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One tick of raw input. Built fresh every tick and never kept around.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ControllerSnapshot {
    buttons: [bool; PadButton::COUNT],
    axes: [i16; PadAxis::COUNT],
}

impl ControllerSnapshot {
    /// All buttons released, all axes centered
    pub fn neutral() -> Self {
        Self {
            buttons: [false; PadButton::COUNT],
            axes: [0; PadAxis::COUNT],
        }
    }

    pub fn with_button(mut self, button: PadButton, pressed: bool) -> Self {
        self.buttons[button.index()] = pressed;
        self
    }

    pub fn with_axis(mut self, axis: PadAxis, value: i16) -> Self {
        self.axes[axis.index()] = value;
        self
    }

    pub fn button(&self, button: PadButton) -> bool {
        self.buttons[button.index()]
    }

    pub fn axis(&self, axis: PadAxis) -> i16 {
        self.axes[axis.index()]
    }
}

impl Default for ControllerSnapshot {
    fn default() -> Self {
        Self::neutral()
    }
}

impl fmt::Debug for ControllerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pressed: Vec<PadButton> = PadButton::ALL
            .iter()
            .copied()
            .filter(|b| self.button(*b))
            .collect();
        f.debug_struct("ControllerSnapshot")
            .field("pressed", &pressed)
            .field("axes", &self.axes)
            .finish()
    }
}

/// Event drained from the sampler at the top of a tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SamplerEvent {
    Quit,
    Other,
}

/// Source of raw controller state for a single controller
///
/// Reads are point-in-time and must not block. `poll_events` is called once per
/// tick before any state is read and is where implementations pump their
/// backend's event queue.
pub trait Sampler {
    fn poll_events(&mut self) -> Vec<SamplerEvent>;

    fn button_state(&self, button: PadButton) -> bool;

    fn axis_value(&self, axis: PadAxis) -> i16;

    /// Display name of the sampled controller
    fn name(&self) -> &str;

    fn snapshot(&self) -> ControllerSnapshot {
        let mut snapshot = ControllerSnapshot::neutral();
        for button in PadButton::ALL {
            snapshot = snapshot.with_button(button, self.button_state(button));
        }
        for axis in PadAxis::ALL {
            snapshot = snapshot.with_axis(axis, self.axis_value(axis));
        }
        snapshot
    }
}
