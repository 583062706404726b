//! Translation of controller state into keyboard key transitions.
//!
//! The engine is level-triggered: every tick it compares the wanted key state
//! against the keys it already holds and only emits the difference. Directions
//! go through a pluggable [`DirectionStrategy`] so the key can either be held
//! or auto-repeated while a direction stays active.

pub mod direction;
pub mod engine;
pub mod error;
pub mod keys;
pub mod strategy;

// Re-exports für einfacheren Zugriff
pub use direction::{resolve_directions, Direction, DirectionSet};
pub use engine::{EngineSettings, PressedKeySet, TranslationEngine};
pub use error::MappingError;
pub use keys::{KeyTable, LogicalKey};
pub use strategy::{DirectionMode, DirectionStrategy, RepeatTiming};
