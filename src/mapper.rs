//! Tick driver with statum state machine for the mapper lifecycle
//!
//! # State Machine
//!
//! ```text
//! Initializing ──► Running ──► ShuttingDown
//!   (handles        (sample,     (release held keys,
//!    acquired)       translate,   then close the controller)
//!                    sleep)
//! ```
//!
//! The engine field is declared before the sampler field. Whatever way the
//! mapper goes away, held keys are released before the controller and the
//! gamepad subsystem are dropped.

use crate::config::{ConfigError, MapperConfig};
use crate::controller::{CollectorError, EventCollector, Sampler, SamplerEvent};
use crate::emitter::{EmitterError, EnigoEmitter, KeyEmitter, TracingEmitter};
use crate::mapping::{KeyTable, MappingError, TranslationEngine};
use chrono::{DateTime, Local};
use statum::{machine, state};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error("Controller error: {0}")]
    Collector(#[from] CollectorError),

    #[error("Emitter error: {0}")]
    Emitter(#[from] EmitterError),

    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl MapperError {
    /// Text for the alert dialog
    pub fn user_message(&self) -> String {
        match self {
            MapperError::Collector(CollectorError::NoGamepadError) => {
                "No game controller detected. Please connect a controller and try again."
                    .to_string()
            }
            MapperError::Collector(CollectorError::OpenError(_)) => {
                "Failed to open the game controller. Please reconnect the controller and try again."
                    .to_string()
            }
            other => format!("Failed to initialize controller mapper: {}", other),
        }
    }
}

/// Counts ticks and key transitions, logged every ten seconds
#[derive(Debug)]
pub struct TickStats {
    ticks: u64,
    transitions: u64,
    window_start: DateTime<Local>,
}

impl TickStats {
    const LOG_INTERVAL_SECS: i64 = 10;

    fn new() -> Self {
        Self {
            ticks: 0,
            transitions: 0,
            window_start: Local::now(),
        }
    }

    fn record(&mut self, transitions: usize) {
        self.ticks += 1;
        self.transitions += transitions as u64;

        let now = Local::now();
        let window = chrono::Duration::seconds(Self::LOG_INTERVAL_SECS);
        if now - self.window_start > window {
            debug!(
                "Mapper stats: {} ticks, {} key transitions in last {} seconds (avg {:.1} ticks/sec)",
                self.ticks,
                self.transitions,
                Self::LOG_INTERVAL_SECS,
                self.ticks as f64 / Self::LOG_INTERVAL_SECS as f64
            );
            self.ticks = 0;
            self.transitions = 0;
            self.window_start = now;
        }
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum MapperState {
    Initializing,
    Running,
    ShuttingDown,
}

#[machine]
pub struct ControllerMapper<S: MapperState> {
    // Dropped first: releases anything still held
    engine: TranslationEngine,

    // Dropped second: closes the controller, then the gamepad subsystem
    sampler: Box<dyn Sampler>,

    poll_interval: Duration,

    stats: TickStats,
}

/// Opens the first gamepad and the key emitter chosen by the config
pub fn open_platform(
    config: &MapperConfig,
    shutdown: CancellationToken,
) -> Result<(Box<dyn Sampler>, Box<dyn KeyEmitter>), MapperError> {
    let sampler: Box<dyn Sampler> = Box::new(EventCollector::create(shutdown)?.initialize()?);

    let emitter: Box<dyn KeyEmitter> = if config.dry_run {
        warn!("Dry run enabled, key events are logged but not sent");
        Box::new(TracingEmitter)
    } else {
        Box::new(EnigoEmitter::new()?)
    };

    Ok((sampler, emitter))
}

impl ControllerMapper<Initializing> {
    pub fn create(
        sampler: Box<dyn Sampler>,
        emitter: Box<dyn KeyEmitter>,
        config: &MapperConfig,
    ) -> Result<Self, MapperError> {
        info!("Creating controller mapper for: {}", sampler.name());
        config.validate()?;

        let engine = TranslationEngine::new(KeyTable::standard()?, config.engine_settings(), emitter)?;

        Ok(Self::new(
            engine,
            sampler,
            config.poll_interval(),
            TickStats::new(),
        ))
    }

    pub fn start(self) -> ControllerMapper<Running> {
        info!(
            "Controller mapper started ({} directions, {:?} poll interval)",
            self.engine.direction_mode(),
            self.poll_interval
        );
        self.transition()
    }
}

impl ControllerMapper<Running> {
    /// Runs one tick; returns false once a quit signal was observed
    ///
    /// Quit is only checked here at the tick boundary, before any input is read.
    pub fn tick(&mut self) -> bool {
        let quit = self
            .sampler
            .poll_events()
            .iter()
            .any(|event| *event == SamplerEvent::Quit);
        if quit {
            info!("Quit signal received");
            return false;
        }

        let snapshot = self.sampler.snapshot();
        let transitions = self.engine.tick(&snapshot, Instant::now());
        self.stats.record(transitions);
        true
    }

    pub async fn run_until_quit(mut self) -> ControllerMapper<ShuttingDown> {
        info!("Starting poll loop for: {}", self.sampler.name());

        while self.tick() {
            tokio::time::sleep(self.poll_interval).await;
        }

        info!("Transitioning to ShuttingDown state");
        self.transition()
    }
}

impl ControllerMapper<ShuttingDown> {
    /// Releases every held key, then closes the controller and the subsystem
    pub fn shutdown(mut self) -> usize {
        let released = self.engine.release_all();
        info!(
            "Released {} keys, closing controller: {}",
            released,
            self.sampler.name()
        );
        // Feld-Reihenfolge: engine vor sampler
        drop(self);
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ControllerSnapshot, PadAxis, PadButton};
    use crate::emitter::testing::{take, Call, CallLog, RecordingEmitter};
    use crate::mapping::{DirectionMode, LogicalKey};
    use std::collections::VecDeque;

    /// Replays frames, then reports Quit once they run out
    struct ScriptedSampler {
        frames: VecDeque<ControllerSnapshot>,
        current: ControllerSnapshot,
        log: CallLog,
    }

    impl ScriptedSampler {
        fn new(frames: Vec<ControllerSnapshot>, log: CallLog) -> Self {
            Self {
                frames: frames.into(),
                current: ControllerSnapshot::neutral(),
                log,
            }
        }
    }

    impl Sampler for ScriptedSampler {
        fn poll_events(&mut self) -> Vec<SamplerEvent> {
            match self.frames.pop_front() {
                Some(frame) => {
                    self.current = frame;
                    vec![SamplerEvent::Other]
                }
                None => vec![SamplerEvent::Other, SamplerEvent::Quit],
            }
        }

        fn button_state(&self, button: PadButton) -> bool {
            self.current.button(button)
        }

        fn axis_value(&self, axis: PadAxis) -> i16 {
            self.current.axis(axis)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    impl Drop for ScriptedSampler {
        fn drop(&mut self) {
            self.log.borrow_mut().push(Call::ControllerClosed);
        }
    }

    fn mapper(frames: Vec<ControllerSnapshot>, config: MapperConfig) -> (ControllerMapper<Running>, CallLog) {
        let (emitter, log) = RecordingEmitter::new();
        let sampler = ScriptedSampler::new(frames, log.clone());
        let mapper = ControllerMapper::create(Box::new(sampler), Box::new(emitter), &config)
            .unwrap()
            .start();
        (mapper, log)
    }

    fn fast_config() -> MapperConfig {
        MapperConfig {
            poll_interval_ms: 10,
            ..MapperConfig::default()
        }
    }

    #[tokio::test]
    async fn shutdown_releases_held_keys_before_closing_controller() {
        let frames = vec![
            ControllerSnapshot::neutral().with_button(PadButton::A, true),
            ControllerSnapshot::neutral()
                .with_button(PadButton::A, true)
                .with_axis(PadAxis::LeftX, -20000),
        ];
        let (mapper, log) = mapper(frames, fast_config());

        let stopping = mapper.run_until_quit().await;
        assert_eq!(
            take(&log),
            vec![Call::Down(LogicalKey::Shift), Call::Down(LogicalKey::Left)]
        );

        assert_eq!(stopping.shutdown(), 2);
        assert_eq!(
            take(&log),
            vec![
                Call::Up(LogicalKey::Shift),
                Call::Up(LogicalKey::Left),
                Call::ControllerClosed
            ]
        );
    }

    #[tokio::test]
    async fn quit_on_first_tick_touches_no_keys() {
        let (mapper, log) = mapper(Vec::new(), fast_config());

        let stopping = mapper.run_until_quit().await;
        assert_eq!(stopping.shutdown(), 0);
        assert_eq!(take(&log), vec![Call::ControllerClosed]);
    }

    #[tokio::test]
    async fn identical_frames_emit_once() {
        let held = ControllerSnapshot::neutral().with_axis(PadAxis::TriggerLeft, 20000);
        let released = ControllerSnapshot::neutral();
        let (mapper, log) = mapper(vec![held, held, held, released, released], fast_config());

        let stopping = mapper.run_until_quit().await;
        stopping.shutdown();
        assert_eq!(
            take(&log),
            vec![
                Call::Down(LogicalKey::A),
                Call::Up(LogicalKey::A),
                Call::ControllerClosed
            ]
        );
    }

    #[test]
    fn dropping_a_running_mapper_still_releases_keys_first() {
        let frames = vec![ControllerSnapshot::neutral().with_button(PadButton::DPadUp, true)];
        let config = MapperConfig {
            direction_mode: DirectionMode::Repeat,
            ..fast_config()
        };
        let (mut mapper, log) = mapper(frames, config);

        assert!(mapper.tick());
        drop(mapper);
        assert_eq!(
            take(&log),
            vec![
                Call::Down(LogicalKey::Up),
                Call::Up(LogicalKey::Up),
                Call::ControllerClosed
            ]
        );
    }

    #[test]
    fn invalid_config_fails_during_initialization() {
        let log = CallLog::default();
        let sampler = ScriptedSampler::new(Vec::new(), log.clone());
        let config = MapperConfig {
            poll_interval_ms: 100,
            ..MapperConfig::default()
        };

        let result = ControllerMapper::create(
            Box::new(sampler),
            Box::new(RecordingEmitter::with_log(log.clone())),
            &config,
        );
        assert!(matches!(result, Err(MapperError::Config(_))));
        assert_eq!(take(&log), vec![Call::ControllerClosed]);
    }

    #[test]
    fn alert_text_names_the_missing_controller() {
        let err = MapperError::from(CollectorError::NoGamepadError);
        assert!(err.user_message().contains("No game controller detected"));

        let err = MapperError::from(CollectorError::InitializationError("boom".into()));
        assert!(err.user_message().contains("boom"));
    }
}
