//! Controller subsystem for gamepad input sampling
//!
//! 1. [`snapshot`] - Button/axis indices, per-tick snapshots and the [`Sampler`] trait
//! 2. [`collector`] - gilrs backed sampler for the first connected gamepad
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► EventCollector<Collecting> ──► ControllerSnapshot (once per tick)
//! ```
//!
//! Reads never block; the collector drains the gilrs event queue at the top of
//! every tick and answers point-in-time state queries afterwards.

pub mod collector;
pub mod snapshot;

pub use collector::{CollectorError, EventCollector};
pub use snapshot::{ControllerSnapshot, PadAxis, PadButton, Sampler, SamplerEvent};
