//! Direction strategies: what a direction key does while its direction is held
//!
//! Two mutually exclusive behaviors exist. [`LevelStrategy`] holds the key for as
//! long as the direction is active. [`RepeatStrategy`] presses once, waits an
//! initial delay, then pulses the key at a fixed cadence like OS key repeat.

use crate::mapping::direction::{Direction, DirectionSet};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::time::{Duration, Instant};

/// Selects the direction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionMode {
    /// Key held continuously while the direction is active
    #[default]
    Level,

    /// Press, then release+press pulses after an initial delay
    Repeat,
}

impl Display for DirectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectionMode::Level => write!(f, "level"),
            DirectionMode::Repeat => write!(f, "repeat"),
        }
    }
}

impl DirectionMode {
    pub fn create_strategy(&self, timing: RepeatTiming) -> Box<dyn DirectionStrategy> {
        match self {
            DirectionMode::Level => Box::new(LevelStrategy),
            DirectionMode::Repeat => Box::new(RepeatStrategy::new(timing)),
        }
    }
}

/// Initial delay and cadence for [`RepeatStrategy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTiming {
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl Default for RepeatTiming {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            interval: Duration::from_millis(50),
        }
    }
}

/// What the engine must do with a direction key this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionAction {
    /// Ensure the key is held
    Hold,
    /// Ensure the key is released
    Release,
    /// Release then press again, producing a fresh key-down edge
    Pulse,
}

/// Turns the active direction set into one action per direction
pub trait DirectionStrategy {
    fn resolve(
        &mut self,
        active: DirectionSet,
        now: Instant,
    ) -> [(Direction, DirectionAction); Direction::COUNT];

    /// Forgets any timing state, called once every key has been released
    fn reset(&mut self);

    fn mode(&self) -> DirectionMode;
}

/// Level-triggered: the key mirrors the direction bit
#[derive(Debug, Default)]
pub struct LevelStrategy;

impl DirectionStrategy for LevelStrategy {
    fn resolve(
        &mut self,
        active: DirectionSet,
        _now: Instant,
    ) -> [(Direction, DirectionAction); Direction::COUNT] {
        Direction::ALL.map(|direction| {
            if active.contains(direction) {
                (direction, DirectionAction::Hold)
            } else {
                (direction, DirectionAction::Release)
            }
        })
    }

    fn reset(&mut self) {}

    fn mode(&self) -> DirectionMode {
        DirectionMode::Level
    }
}

/// Auto-repeat: pulses at t=0, then t=delay, delay+interval, ...
///
/// Each direction keeps the instant the next repeat is measured from. The
/// instant advances by `interval` on every pulse rather than jumping to the
/// current tick, so the cadence does not drift with tick jitter.
#[derive(Debug)]
pub struct RepeatStrategy {
    timing: RepeatTiming,
    state: [Option<Instant>; Direction::COUNT],
}

impl RepeatStrategy {
    pub fn new(timing: RepeatTiming) -> Self {
        Self {
            timing,
            state: [None; Direction::COUNT],
        }
    }

    pub fn is_active(&self, direction: Direction) -> bool {
        self.state[direction.index()].is_some()
    }
}

impl DirectionStrategy for RepeatStrategy {
    fn resolve(
        &mut self,
        active: DirectionSet,
        now: Instant,
    ) -> [(Direction, DirectionAction); Direction::COUNT] {
        let timing = self.timing;
        Direction::ALL.map(|direction| {
            let slot = &mut self.state[direction.index()];
            let action = match (active.contains(direction), *slot) {
                (false, _) => {
                    *slot = None;
                    DirectionAction::Release
                }
                (true, None) => {
                    *slot = Some(now);
                    DirectionAction::Hold
                }
                (true, Some(since)) => {
                    if now.saturating_duration_since(since) >= timing.initial_delay {
                        *slot = Some(since + timing.interval);
                        DirectionAction::Pulse
                    } else {
                        DirectionAction::Hold
                    }
                }
            };
            (direction, action)
        })
    }

    fn reset(&mut self) {
        self.state = [None; Direction::COUNT];
    }

    fn mode(&self) -> DirectionMode {
        DirectionMode::Repeat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action_for(
        actions: [(Direction, DirectionAction); Direction::COUNT],
        direction: Direction,
    ) -> DirectionAction {
        actions
            .into_iter()
            .find(|(d, _)| *d == direction)
            .map(|(_, a)| a)
            .unwrap()
    }

    fn only(direction: Direction) -> DirectionSet {
        [direction].into_iter().collect()
    }

    #[test]
    fn level_strategy_mirrors_the_set() {
        let mut strategy = LevelStrategy;
        let actions = strategy.resolve(only(Direction::Left), Instant::now());
        assert_eq!(action_for(actions, Direction::Left), DirectionAction::Hold);
        assert_eq!(action_for(actions, Direction::Right), DirectionAction::Release);
        assert_eq!(action_for(actions, Direction::Up), DirectionAction::Release);
    }

    #[test]
    fn repeat_strategy_waits_for_initial_delay() {
        let start = Instant::now();
        let mut strategy = RepeatStrategy::new(RepeatTiming::default());

        let first = strategy.resolve(only(Direction::Up), start);
        assert_eq!(action_for(first, Direction::Up), DirectionAction::Hold);
        assert!(strategy.is_active(Direction::Up));

        for ms in (10..500).step_by(10) {
            let actions = strategy.resolve(only(Direction::Up), start + Duration::from_millis(ms));
            assert_eq!(
                action_for(actions, Direction::Up),
                DirectionAction::Hold,
                "unexpected pulse at {ms} ms"
            );
        }

        let at_delay = strategy.resolve(only(Direction::Up), start + Duration::from_millis(500));
        assert_eq!(action_for(at_delay, Direction::Up), DirectionAction::Pulse);
    }

    #[test]
    fn repeat_cadence_is_anchored_to_the_schedule() {
        let start = Instant::now();
        let mut strategy = RepeatStrategy::new(RepeatTiming::default());
        strategy.resolve(only(Direction::Right), start);

        let mut pulses = Vec::new();
        for ms in (10..=700).step_by(10) {
            let actions =
                strategy.resolve(only(Direction::Right), start + Duration::from_millis(ms));
            if action_for(actions, Direction::Right) == DirectionAction::Pulse {
                pulses.push(ms);
            }
        }
        assert_eq!(pulses, vec![500, 550, 600, 650, 700]);
    }

    #[test]
    fn releasing_clears_the_timestamp() {
        let start = Instant::now();
        let mut strategy = RepeatStrategy::new(RepeatTiming::default());
        strategy.resolve(only(Direction::Down), start);

        let released = strategy.resolve(DirectionSet::empty(), start + Duration::from_millis(100));
        assert_eq!(action_for(released, Direction::Down), DirectionAction::Release);
        assert!(!strategy.is_active(Direction::Down));

        // A fresh hold restarts the initial delay
        let again = start + Duration::from_millis(600);
        strategy.resolve(only(Direction::Down), again);
        let soon = strategy.resolve(only(Direction::Down), again + Duration::from_millis(490));
        assert_eq!(action_for(soon, Direction::Down), DirectionAction::Hold);
    }

    #[test]
    fn reset_forgets_all_directions() {
        let mut strategy = RepeatStrategy::new(RepeatTiming::default());
        let all: DirectionSet = Direction::ALL.into_iter().collect();
        strategy.resolve(all, Instant::now());
        strategy.reset();
        for direction in Direction::ALL {
            assert!(!strategy.is_active(direction));
        }
    }

    #[test]
    fn mode_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: DirectionMode,
        }
        let parsed: Wrapper = toml::from_str("mode = \"repeat\"").unwrap();
        assert_eq!(parsed.mode, DirectionMode::Repeat);
        assert_eq!(DirectionMode::default(), DirectionMode::Level);
        assert_eq!(
            DirectionMode::Repeat.create_strategy(RepeatTiming::default()).mode(),
            DirectionMode::Repeat
        );
    }
}
