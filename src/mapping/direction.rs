//! Direction set and merging of D-pad and left stick input

use crate::controller::{ControllerSnapshot, PadAxis, PadButton};
use std::fmt;

/// Default analog deadzone out of 32767
pub const ANALOG_DEADZONE: i16 = 8000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const COUNT: usize = 4;

    pub const ALL: [Direction; Direction::COUNT] =
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn dpad_button(self) -> PadButton {
        match self {
            Direction::Up => PadButton::DPadUp,
            Direction::Down => PadButton::DPadDown,
            Direction::Left => PadButton::DPadLeft,
            Direction::Right => PadButton::DPadRight,
        }
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }
}

/// Set of logically active directions for one tick
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionSet {
    bits: u8,
}

impl DirectionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, direction: Direction) {
        self.bits |= direction.bit();
    }

    pub fn contains(&self, direction: Direction) -> bool {
        self.bits & direction.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = DirectionSet::empty();
        for direction in iter {
            set.insert(direction);
        }
        set
    }
}

impl fmt::Debug for DirectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Builds the direction set for a snapshot by OR-ing the D-pad with the left stick
///
/// A stick axis counts only when strictly beyond `deadzone`, so exactly
/// `±deadzone` is neutral. Negative X is left, negative Y is up.
pub fn resolve_directions(snapshot: &ControllerSnapshot, deadzone: i16) -> DirectionSet {
    let mut active: DirectionSet = Direction::ALL
        .into_iter()
        .filter(|d| snapshot.button(d.dpad_button()))
        .collect();

    let deadzone = i32::from(deadzone);
    let x = i32::from(snapshot.axis(PadAxis::LeftX));
    let y = i32::from(snapshot.axis(PadAxis::LeftY));

    if x > deadzone {
        active.insert(Direction::Right);
    } else if x < -deadzone {
        active.insert(Direction::Left);
    }
    if y > deadzone {
        active.insert(Direction::Down);
    } else if y < -deadzone {
        active.insert(Direction::Up);
    }

    active
}
