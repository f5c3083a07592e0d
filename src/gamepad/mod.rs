mod messages;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use serde::Deserialize;
use tokio::{sync::Mutex, time::Instant};
use tracing::*;
use zenoh::{prelude::r#async::*, subscriber::FlumeSubscriber, Session, SessionDeclarations};

use crate::{error::ErrorWrapper, holonomic_controller::MoveCommand};
pub use messages::{Axis, Button, GamepadMessage, InputMessage};

pub const GAMEPAD_TOPIC: &str = "remote-control/gamepad";

#[derive(Deserialize, Debug, Clone)]
pub struct GamepadConfig {
    #[serde(default = "default_deadzone")]
    pub deadzone: f32,
    /// Negate the forward stick for controllers that report up as negative
    #[serde(default)]
    pub invert_forward_axis: bool,
    /// Input older than this reads as neutral
    #[serde(default = "default_input_timeout_ms")]
    pub input_timeout_ms: u64,
}

fn default_deadzone() -> f32 {
    0.07
}

fn default_input_timeout_ms() -> u64 {
    500
}

impl Default for GamepadConfig {
    fn default() -> Self {
        Self {
            deadzone: default_deadzone(),
            invert_forward_axis: false,
            input_timeout_ms: default_input_timeout_ms(),
        }
    }
}

impl GamepadConfig {
    pub fn input_timeout(&self) -> Duration {
        Duration::from_millis(self.input_timeout_ms)
    }
}

/// Controller state sampled once per control cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeleopInput {
    /// Forward positive
    pub left_stick_y: f32,
    /// Strafe right positive
    pub left_stick_x: f32,
    /// Clockwise positive
    pub right_stick_x: f32,
    pub right_bumper: bool,
    pub right_trigger: f32,
    pub a: bool,
    pub b: bool,
}

impl TeleopInput {
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn from_gamepad(gamepad: &GamepadMessage, config: &GamepadConfig) -> Self {
        if !gamepad.connected {
            return Self::neutral();
        }
        let forward = apply_deadzone(gamepad.axis(Axis::LeftStickY), config.deadzone);
        Self {
            left_stick_y: if config.invert_forward_axis {
                -forward
            } else {
                forward
            },
            left_stick_x: apply_deadzone(gamepad.axis(Axis::LeftStickX), config.deadzone),
            right_stick_x: apply_deadzone(gamepad.axis(Axis::RightStickX), config.deadzone),
            right_bumper: gamepad.button(Button::RightTrigger),
            right_trigger: gamepad.axis(Axis::RightZ),
            a: gamepad.button(Button::South),
            b: gamepad.button(Button::East),
        }
    }

    pub fn move_command(&self) -> MoveCommand {
        MoveCommand::new(self.left_stick_y, self.left_stick_x, self.right_stick_x)
    }
}

fn apply_deadzone(value: f32, deadzone: f32) -> f32 {
    if value.abs() < deadzone {
        0.0
    } else {
        value
    }
}

/// Latest controller input together with when it arrived.
#[derive(Debug, Clone)]
pub struct SharedInput {
    last_input: Arc<Mutex<Option<(TeleopInput, Instant)>>>,
    timeout: Duration,
}

impl SharedInput {
    pub fn new(timeout: Duration) -> Self {
        Self {
            last_input: Arc::new(Mutex::new(None)),
            timeout,
        }
    }

    pub async fn set(&self, input: TeleopInput) {
        *self.last_input.lock().await = Some((input, Instant::now()));
    }

    /// `None` if nothing arrived yet or the last input is stale
    pub async fn latest(&self) -> Option<TeleopInput> {
        match *self.last_input.lock().await {
            Some((input, time)) if time.elapsed() <= self.timeout => Some(input),
            _ => None,
        }
    }
}

const MIN_RESTART_DELAY: Duration = Duration::from_millis(100);
const MAX_RESTART_DELAY: Duration = Duration::from_secs(5);
/// A listener that ran at least this long counts as healthy again
const HEALTHY_RUN: Duration = Duration::from_secs(10);

/// Doubles with every consecutive failure, capped at `MAX_RESTART_DELAY`.
fn restart_delay(consecutive_failures: u32) -> Duration {
    MIN_RESTART_DELAY
        .saturating_mul(2_u32.saturating_pow(consecutive_failures))
        .min(MAX_RESTART_DELAY)
}

pub async fn start_gamepad_listener(
    zenoh_session: Arc<Session>,
    input: SharedInput,
    config: GamepadConfig,
) -> Result<()> {
    let mut gamepad_subscriber = zenoh_session
        .declare_subscriber(GAMEPAD_TOPIC)
        .res()
        .await
        .map_err(ErrorWrapper::ZenohError)?;

    info!("Listening for gamepad on {}", GAMEPAD_TOPIC);
    tokio::spawn(async move {
        let mut consecutive_failures = 0;
        loop {
            let started = Instant::now();
            if let Err(err) = run_gamepad_listener(&mut gamepad_subscriber, &input, &config).await
            {
                error!("Gamepad listener failed with {:?}", err);
            }
            if started.elapsed() >= HEALTHY_RUN {
                consecutive_failures = 0;
            }
            tokio::time::sleep(restart_delay(consecutive_failures)).await;
            consecutive_failures = consecutive_failures.saturating_add(1);
        }
    });
    Ok(())
}

async fn run_gamepad_listener(
    subscriber: &mut FlumeSubscriber<'_>,
    input: &SharedInput,
    config: &GamepadConfig,
) -> anyhow::Result<()> {
    loop {
        let sample = subscriber.recv_async().await?;
        let message: String = sample.value.try_into()?;
        let message: InputMessage = match serde_json::from_str(&message) {
            Ok(message) => message,
            Err(err) => {
                warn!("Failed to parse gamepad message {:?}", err);
                continue;
            }
        };

        if let Some(gamepad) = message.get_first() {
            let teleop_input = TeleopInput::from_gamepad(gamepad, config);
            trace!(?teleop_input, "Received gamepad input");
            input.set(teleop_input).await;
        }
    }
}
