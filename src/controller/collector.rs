use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::controller::snapshot::{PadAxis, PadButton, Sampler, SamplerEvent};

// Collector errors
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("Failed to initialize gamepad subsystem: {0}")]
    InitializationError(String),

    #[error("No gamepad connected")]
    NoGamepadError,

    #[error("Failed to open gamepad: {0}")]
    OpenError(String),
}

// Define collector states using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum CollectionState {
    Initializing,
    Collecting,
}

#[machine]
#[derive(Debug)]
pub struct EventCollector<S: CollectionState> {
    // Gilrs context, dropping it tears the subsystem down
    gilrs: Gilrs,

    // Active gamepad
    active_gamepad: Option<GamepadId>,

    // Display name of the active gamepad
    gamepad_name: String,

    // Cancelled by the signal handler, surfaces as SamplerEvent::Quit
    shutdown: CancellationToken,
}

impl EventCollector<Initializing> {
    pub fn create(shutdown: CancellationToken) -> Result<Self, CollectorError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(CollectorError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(gilrs, None, String::new(), shutdown))
    }

    /// Selects the first connected gamepad and transitions to Collecting
    pub fn initialize(mut self) -> Result<EventCollector<Collecting>, CollectorError> {
        let gamepads: Vec<(GamepadId, Gamepad<'_>)> = self.gilrs.gamepads().collect();

        if gamepads.is_empty() {
            error!("No gamepad connected");
            return Err(CollectorError::NoGamepadError);
        }

        info!("Found {} gamepads:", gamepads.len());
        for (idx, (id, gamepad)) in gamepads.iter().enumerate() {
            info!(
                "  [{}] ID: {}, Name: {}, UUID: {:?}",
                idx,
                id,
                gamepad.name(),
                gamepad.uuid()
            );
        }

        let id = gamepads[0].0;
        drop(gamepads);

        let name = match self.gilrs.connected_gamepad(id) {
            Some(gamepad) => gamepad.name().to_string(),
            None => {
                error!("Gamepad {} vanished before it could be opened", id);
                return Err(CollectorError::OpenError(format!(
                    "gamepad {} is no longer connected",
                    id
                )));
            }
        };

        info!("Controller detected: {} ({})", name, id);
        self.active_gamepad = Some(id);
        self.gamepad_name = name;

        Ok(self.transition())
    }
}

impl EventCollector<Collecting> {
    fn active(&self) -> Option<Gamepad<'_>> {
        self.active_gamepad
            .and_then(|id| self.gilrs.connected_gamepad(id))
    }

    fn log_event(&self, id: GamepadId, event: &EventType) {
        if Some(id) != self.active_gamepad {
            debug!("Skipping event from non-active gamepad: {:?}", id);
            return;
        }
        match event {
            EventType::Disconnected => {
                warn!("Controller disconnected, inputs will read as neutral")
            }
            EventType::Connected => info!("Controller connected event detected"),
            EventType::ButtonPressed(button, _) | EventType::ButtonReleased(button, _) => {
                debug!("Button event: {:?}", event);
                if map_button(*button).is_none() {
                    debug!("Ignoring unsupported button: {:?}", button);
                }
            }
            _ => {}
        }
    }
}

impl Sampler for EventCollector<Collecting> {
    fn poll_events(&mut self) -> Vec<SamplerEvent> {
        let mut events = Vec::new();

        // gilrs only updates its cached state while its queue is drained
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            self.log_event(id, &event);
            events.push(SamplerEvent::Other);
        }

        if self.shutdown.is_cancelled() {
            events.push(SamplerEvent::Quit);
        }
        events
    }

    fn button_state(&self, button: PadButton) -> bool {
        self.active()
            .map(|gamepad| gamepad.is_pressed(gilrs_button(button)))
            .unwrap_or(false)
    }

    fn axis_value(&self, axis: PadAxis) -> i16 {
        let Some(gamepad) = self.active() else {
            return 0;
        };

        match axis {
            PadAxis::LeftX => stick_to_raw(gamepad.value(Axis::LeftStickX)),
            PadAxis::RightX => stick_to_raw(gamepad.value(Axis::RightStickX)),
            // gilrs reports up as positive
            PadAxis::LeftY => stick_to_raw(-gamepad.value(Axis::LeftStickY)),
            PadAxis::RightY => stick_to_raw(-gamepad.value(Axis::RightStickY)),
            PadAxis::TriggerLeft => trigger_to_raw(trigger_value(
                &gamepad,
                Button::LeftTrigger2,
                Axis::LeftZ,
            )),
            PadAxis::TriggerRight => trigger_to_raw(trigger_value(
                &gamepad,
                Button::RightTrigger2,
                Axis::RightZ,
            )),
        }
    }

    fn name(&self) -> &str {
        &self.gamepad_name
    }
}

// Analog triggers show up as button data on most mappings and as Z axes on some
fn trigger_value(gamepad: &Gamepad<'_>, button: Button, axis: Axis) -> f32 {
    let from_button = gamepad
        .button_data(button)
        .map(|data| data.value())
        .unwrap_or(0.0);
    from_button.max(gamepad.value(axis))
}

// Helper function to map our PadButton to the gilrs button
fn gilrs_button(button: PadButton) -> Button {
    match button {
        PadButton::A => Button::South,
        PadButton::B => Button::East,
        PadButton::X => Button::West,
        PadButton::Y => Button::North,
        PadButton::Back => Button::Select,
        PadButton::Guide => Button::Mode,
        PadButton::Start => Button::Start,
        PadButton::LeftStick => Button::LeftThumb,
        PadButton::RightStick => Button::RightThumb,
        PadButton::LeftShoulder => Button::LeftTrigger,
        PadButton::RightShoulder => Button::RightTrigger,
        PadButton::DPadUp => Button::DPadUp,
        PadButton::DPadDown => Button::DPadDown,
        PadButton::DPadLeft => Button::DPadLeft,
        PadButton::DPadRight => Button::DPadRight,
    }
}

fn map_button(button: Button) -> Option<PadButton> {
    PadButton::ALL
        .into_iter()
        .find(|candidate| gilrs_button(*candidate) == button)
}

/// Scales a gilrs stick value (-1.0..=1.0) to the signed 16-bit range
fn stick_to_raw(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Scales a gilrs trigger value (0.0..=1.0) to 0..=i16::MAX
fn trigger_to_raw(value: f32) -> i16 {
    (value.clamp(0.0, 1.0) * i16::MAX as f32).round() as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stick_scaling_covers_full_range() {
        assert_eq!(stick_to_raw(0.0), 0);
        assert_eq!(stick_to_raw(1.0), i16::MAX);
        assert_eq!(stick_to_raw(-1.0), -i16::MAX);
        assert_eq!(stick_to_raw(2.5), i16::MAX);
        assert_eq!(stick_to_raw(0.5), 16384);
    }

    #[test]
    fn trigger_scaling_ignores_negative_rest_values() {
        assert_eq!(trigger_to_raw(-1.0), 0);
        assert_eq!(trigger_to_raw(0.0), 0);
        assert_eq!(trigger_to_raw(1.0), i16::MAX);
    }

    #[test]
    fn button_mapping_is_a_bijection() {
        for button in PadButton::ALL {
            assert_eq!(map_button(gilrs_button(button)), Some(button));
        }
        assert_eq!(map_button(Button::LeftTrigger2), None);
        assert_eq!(map_button(Button::C), None);
    }
}
