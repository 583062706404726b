//! Logical keys and the static controller → key table

use crate::controller::{PadAxis, PadButton};
use crate::mapping::direction::Direction;
use crate::mapping::MappingError;
use std::collections::HashSet;
use std::fmt::{self, Display};

/// Keyboard key the engine can press, compared by value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogicalKey {
    Shift,
    Space,
    LeftCtrl,
    X,
    Tab,
    K,
    Escape,
    Digit3,
    Digit2,
    Q,
    W,
    A,
    S,
    Up,
    Down,
    Left,
    Right,
}

impl LogicalKey {
    /// Symbol name as used in logs, e.g. `"shift"` or `"up"`
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalKey::Shift => "shift",
            LogicalKey::Space => "space",
            LogicalKey::LeftCtrl => "lctrl",
            LogicalKey::X => "x",
            LogicalKey::Tab => "tab",
            LogicalKey::K => "k",
            LogicalKey::Escape => "esc",
            LogicalKey::Digit3 => "3",
            LogicalKey::Digit2 => "2",
            LogicalKey::Q => "q",
            LogicalKey::W => "w",
            LogicalKey::A => "a",
            LogicalKey::S => "s",
            LogicalKey::Up => "up",
            LogicalKey::Down => "down",
            LogicalKey::Left => "left",
            LogicalKey::Right => "right",
        }
    }
}

impl Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Face, shoulder and meta buttons of the standard layout
pub const STANDARD_BUTTONS: [(PadButton, LogicalKey); 11] = [
    (PadButton::A, LogicalKey::Shift),
    (PadButton::B, LogicalKey::Space),
    (PadButton::X, LogicalKey::LeftCtrl),
    (PadButton::Y, LogicalKey::X),
    (PadButton::Back, LogicalKey::Tab),
    (PadButton::Guide, LogicalKey::K),
    (PadButton::Start, LogicalKey::Escape),
    (PadButton::LeftStick, LogicalKey::Digit3),
    (PadButton::RightStick, LogicalKey::Digit2),
    (PadButton::LeftShoulder, LogicalKey::Q),
    (PadButton::RightShoulder, LogicalKey::W),
];

pub const STANDARD_TRIGGERS: [(PadAxis, LogicalKey); 2] = [
    (PadAxis::TriggerLeft, LogicalKey::A),
    (PadAxis::TriggerRight, LogicalKey::S),
];

pub const STANDARD_DIRECTIONS: [(Direction, LogicalKey); 4] = [
    (Direction::Up, LogicalKey::Up),
    (Direction::Down, LogicalKey::Down),
    (Direction::Left, LogicalKey::Left),
    (Direction::Right, LogicalKey::Right),
];

/// Validated controller → key table
///
/// Buttons are stored by index. Every non-D-pad button is mapped exactly once,
/// the D-pad only feeds directions, and no key is reachable from two sources.
#[derive(Clone, Debug)]
pub struct KeyTable {
    buttons: [Option<LogicalKey>; PadButton::COUNT],
    triggers: Vec<(PadAxis, LogicalKey)>,
    directions: [LogicalKey; Direction::COUNT],
}

impl KeyTable {
    pub fn new(
        buttons: &[(PadButton, LogicalKey)],
        triggers: &[(PadAxis, LogicalKey)],
        directions: &[(Direction, LogicalKey)],
    ) -> Result<Self, MappingError> {
        let mut used_keys = HashSet::new();
        let mut claim = |key: LogicalKey, source: String| {
            if used_keys.insert(key) {
                Ok(())
            } else {
                Err(MappingError::InvalidKeyTable(format!(
                    "key '{}' is already mapped, {} cannot reuse it",
                    key, source
                )))
            }
        };

        let mut button_table = [None; PadButton::COUNT];
        for &(button, key) in buttons {
            if button.is_dpad() {
                return Err(MappingError::InvalidKeyTable(format!(
                    "{:?} is a direction source and cannot map to a key",
                    button
                )));
            }
            let slot = &mut button_table[button.index()];
            if slot.is_some() {
                return Err(MappingError::InvalidKeyTable(format!(
                    "{:?} is mapped twice",
                    button
                )));
            }
            claim(key, format!("{:?}", button))?;
            *slot = Some(key);
        }

        if let Some(missing) = PadButton::ALL
            .into_iter()
            .find(|b| !b.is_dpad() && button_table[b.index()].is_none())
        {
            return Err(MappingError::InvalidKeyTable(format!(
                "{:?} has no key assigned",
                missing
            )));
        }

        let mut trigger_axes = HashSet::new();
        for &(axis, key) in triggers {
            if !matches!(axis, PadAxis::TriggerLeft | PadAxis::TriggerRight) {
                return Err(MappingError::InvalidKeyTable(format!(
                    "{:?} is not a trigger axis",
                    axis
                )));
            }
            if !trigger_axes.insert(axis) {
                return Err(MappingError::InvalidKeyTable(format!(
                    "{:?} is mapped twice",
                    axis
                )));
            }
            claim(key, format!("{:?}", axis))?;
        }

        let mut direction_table: [Option<LogicalKey>; Direction::COUNT] = [None; Direction::COUNT];
        for &(direction, key) in directions {
            let slot = &mut direction_table[direction.index()];
            if slot.is_some() {
                return Err(MappingError::InvalidKeyTable(format!(
                    "direction {:?} is mapped twice",
                    direction
                )));
            }
            claim(key, format!("direction {:?}", direction))?;
            *slot = Some(key);
        }

        let mut resolved = [LogicalKey::Up; Direction::COUNT];
        for direction in Direction::ALL {
            match direction_table[direction.index()] {
                Some(key) => resolved[direction.index()] = key,
                None => {
                    return Err(MappingError::InvalidKeyTable(format!(
                        "direction {:?} has no key assigned",
                        direction
                    )))
                }
            }
        }

        Ok(Self {
            buttons: button_table,
            triggers: triggers.to_vec(),
            directions: resolved,
        })
    }

    /// The built-in layout
    pub fn standard() -> Result<Self, MappingError> {
        Self::new(&STANDARD_BUTTONS, &STANDARD_TRIGGERS, &STANDARD_DIRECTIONS)
    }

    /// Mapped buttons in index order
    pub fn buttons(&self) -> impl Iterator<Item = (PadButton, LogicalKey)> + '_ {
        PadButton::ALL
            .into_iter()
            .filter_map(move |button| self.buttons[button.index()].map(|key| (button, key)))
    }

    pub fn triggers(&self) -> &[(PadAxis, LogicalKey)] {
        &self.triggers
    }

    pub fn direction_key(&self, direction: Direction) -> LogicalKey {
        self.directions[direction.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_is_valid() {
        let table = KeyTable::standard().unwrap();
        assert_eq!(table.buttons().count(), 11);
        assert_eq!(
            table.buttons().next(),
            Some((PadButton::A, LogicalKey::Shift))
        );
        assert_eq!(table.direction_key(Direction::Left), LogicalKey::Left);
        assert_eq!(table.triggers().len(), 2);
    }

    #[test]
    fn rejects_button_mapped_twice() {
        let mut buttons = STANDARD_BUTTONS.to_vec();
        buttons.push((PadButton::A, LogicalKey::Q));
        let err = KeyTable::new(&buttons, &STANDARD_TRIGGERS, &STANDARD_DIRECTIONS).unwrap_err();
        assert!(err.to_string().contains("mapped twice"), "{err}");
    }

    #[test]
    fn rejects_incomplete_button_table() {
        let buttons = &STANDARD_BUTTONS[..10];
        let err = KeyTable::new(buttons, &STANDARD_TRIGGERS, &STANDARD_DIRECTIONS).unwrap_err();
        assert!(err.to_string().contains("RightShoulder"), "{err}");
    }

    #[test]
    fn rejects_dpad_in_button_table() {
        let mut buttons = STANDARD_BUTTONS.to_vec();
        buttons.push((PadButton::DPadUp, LogicalKey::K));
        assert!(KeyTable::new(&buttons, &STANDARD_TRIGGERS, &STANDARD_DIRECTIONS).is_err());
    }

    #[test]
    fn rejects_key_shared_between_sources() {
        let triggers = [
            (PadAxis::TriggerLeft, LogicalKey::Shift),
            (PadAxis::TriggerRight, LogicalKey::S),
        ];
        let err = KeyTable::new(&STANDARD_BUTTONS, &triggers, &STANDARD_DIRECTIONS).unwrap_err();
        assert!(err.to_string().contains("shift"), "{err}");
    }

    #[test]
    fn rejects_stick_axis_as_trigger() {
        let triggers = [(PadAxis::LeftX, LogicalKey::A)];
        assert!(KeyTable::new(&STANDARD_BUTTONS, &triggers, &STANDARD_DIRECTIONS).is_err());
    }

    #[test]
    fn rejects_missing_direction() {
        let directions = &STANDARD_DIRECTIONS[..3];
        let err = KeyTable::new(&STANDARD_BUTTONS, &STANDARD_TRIGGERS, directions).unwrap_err();
        assert!(err.to_string().contains("Right"), "{err}");
    }

    #[test]
    fn symbols_match_display() {
        assert_eq!(LogicalKey::LeftCtrl.to_string(), "lctrl");
        assert_eq!(LogicalKey::Escape.to_string(), "esc");
        assert_eq!(LogicalKey::Digit3.to_string(), "3");
    }
}
