//! Translation engine: controller snapshot in, idempotent key transitions out
//!
//! ```text
//! ControllerSnapshot ──► directions ──► [DirectionStrategy] ──┐
//!        │                                                    ├──► PressedKeySet ──► KeyEmitter
//!        ├──────────► buttons ────────────────────────────────┤
//!        └──────────► triggers ───────────────────────────────┘
//! ```
//!
//! Every key goes through [`TranslationEngine::press_key`] and
//! [`TranslationEngine::release_key`], which consult the pressed set first, so
//! an unchanged snapshot never produces an emitter call.

use crate::controller::ControllerSnapshot;
use crate::emitter::KeyEmitter;
use crate::mapping::direction::{resolve_directions, ANALOG_DEADZONE};
use crate::mapping::keys::{KeyTable, LogicalKey};
use crate::mapping::strategy::{DirectionAction, DirectionMode, DirectionStrategy, RepeatTiming};
use crate::mapping::MappingError;
use chrono::Local;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Trigger value above which a trigger counts as held (midpoint of 0..=32767)
pub const TRIGGER_THRESHOLD: i16 = 16383;

/// Keys the emitter currently holds down on our behalf
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PressedKeySet {
    keys: BTreeSet<LogicalKey>,
}

impl PressedKeySet {
    pub fn contains(&self, key: LogicalKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = LogicalKey> + '_ {
        self.keys.iter().copied()
    }

    fn insert(&mut self, key: LogicalKey) -> bool {
        self.keys.insert(key)
    }

    fn remove(&mut self, key: LogicalKey) -> bool {
        self.keys.remove(&key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub analog_deadzone: i16,
    pub trigger_threshold: i16,
    pub direction_mode: DirectionMode,
    pub repeat: RepeatTiming,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            analog_deadzone: ANALOG_DEADZONE,
            trigger_threshold: TRIGGER_THRESHOLD,
            direction_mode: DirectionMode::default(),
            repeat: RepeatTiming::default(),
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<(), MappingError> {
        if self.analog_deadzone < 0 || self.analog_deadzone == i16::MAX {
            return Err(MappingError::ConfigError(format!(
                "analog deadzone {} must be within 0..32767",
                self.analog_deadzone
            )));
        }
        if self.trigger_threshold < 0 {
            return Err(MappingError::ConfigError(format!(
                "trigger threshold {} must not be negative",
                self.trigger_threshold
            )));
        }
        if self.direction_mode == DirectionMode::Repeat
            && (self.repeat.initial_delay.is_zero() || self.repeat.interval.is_zero())
        {
            return Err(MappingError::ConfigError(
                "repeat delay and interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Owns the key tables, the pressed set and the direction strategy
///
/// Dropping the engine releases every key that is still held, so no exit path
/// can leave a key stuck down.
pub struct TranslationEngine {
    table: KeyTable,
    settings: EngineSettings,
    strategy: Box<dyn DirectionStrategy>,
    emitter: Box<dyn KeyEmitter>,
    pressed: PressedKeySet,
}

impl TranslationEngine {
    pub fn new(
        table: KeyTable,
        settings: EngineSettings,
        emitter: Box<dyn KeyEmitter>,
    ) -> Result<Self, MappingError> {
        settings.validate()?;
        let strategy = settings.direction_mode.create_strategy(settings.repeat);
        info!(
            "Translation engine ready: directions={}, deadzone={}, trigger threshold={}",
            strategy.mode(),
            settings.analog_deadzone,
            settings.trigger_threshold
        );

        Ok(Self {
            table,
            settings,
            strategy,
            emitter,
            pressed: PressedKeySet::default(),
        })
    }

    pub fn pressed(&self) -> &PressedKeySet {
        &self.pressed
    }

    pub fn direction_mode(&self) -> DirectionMode {
        self.strategy.mode()
    }

    /// Translates one snapshot; returns the number of emitter calls made
    pub fn tick(&mut self, snapshot: &ControllerSnapshot, now: Instant) -> usize {
        let mut calls = self.map_directions(snapshot, now);
        calls += self.map_buttons(snapshot);
        calls += self.map_triggers(snapshot);
        calls
    }

    fn map_directions(&mut self, snapshot: &ControllerSnapshot, now: Instant) -> usize {
        let active = resolve_directions(snapshot, self.settings.analog_deadzone);
        let mut calls = 0;

        for (direction, action) in self.strategy.resolve(active, now) {
            let key = self.table.direction_key(direction);
            calls += match action {
                DirectionAction::Hold => self.press_key(key),
                DirectionAction::Release => self.release_key(key),
                DirectionAction::Pulse => {
                    debug!("Repeat pulse for '{}'", key);
                    self.release_key(key) + self.press_key(key)
                }
            };
        }
        calls
    }

    fn map_buttons(&mut self, snapshot: &ControllerSnapshot) -> usize {
        let mut calls = 0;
        for (button, key) in self.table.buttons().collect::<Vec<_>>() {
            calls += self.apply_level(key, snapshot.button(button));
        }
        calls
    }

    fn map_triggers(&mut self, snapshot: &ControllerSnapshot) -> usize {
        let mut calls = 0;
        for (axis, key) in self.table.triggers().to_vec() {
            let held = snapshot.axis(axis) > self.settings.trigger_threshold;
            calls += self.apply_level(key, held);
        }
        calls
    }

    fn apply_level(&mut self, key: LogicalKey, held: bool) -> usize {
        if held {
            self.press_key(key)
        } else {
            self.release_key(key)
        }
    }

    fn press_key(&mut self, key: LogicalKey) -> usize {
        if !self.pressed.insert(key) {
            return 0;
        }
        debug!(
            "Key down: '{}' at {}",
            key,
            Local::now().format("%H:%M:%S.%3f")
        );
        self.emitter.key_down(key);
        1
    }

    fn release_key(&mut self, key: LogicalKey) -> usize {
        if !self.pressed.remove(key) {
            return 0;
        }
        debug!("Key up: '{}' at {}", key, Local::now().format("%H:%M:%S.%3f"));
        self.emitter.key_up(key);
        1
    }

    /// Releases every held key exactly once and clears repeat timing
    pub fn release_all(&mut self) -> usize {
        let held: Vec<LogicalKey> = self.pressed.iter().collect();
        if !held.is_empty() {
            info!("Releasing {} held keys: {:?}", held.len(), held);
        }
        let mut calls = 0;
        for key in held {
            calls += self.release_key(key);
        }
        self.strategy.reset();
        calls
    }
}

impl Drop for TranslationEngine {
    fn drop(&mut self) {
        if !self.pressed.is_empty() {
            warn!(
                "Translation engine dropped with {} keys held, releasing",
                self.pressed.len()
            );
            self.release_all();
        }
    }
}
