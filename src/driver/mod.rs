pub mod serial_driver;
pub mod simulated_driver;

use crate::holonomic_controller::HolonomicWheelCommand;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::*;

pub use serial_driver::{ActuatorError, SerialActuatorBus};
pub use simulated_driver::{SimulatedMotor, SimulatedServo};

/// Anything that accepts a motor power in `[-1.0, 1.0]`.
#[async_trait]
pub trait PowerOutput: Send + Sync {
    async fn set_power(&mut self, power: f32) -> Result<()>;

    /// Last commanded power, before any direction inversion
    fn power(&self) -> f32;
}

/// Anything that accepts a servo position in `[0.0, 1.0]`.
#[async_trait]
pub trait PositionOutput: Send + Sync {
    async fn set_position(&mut self, position: f32) -> Result<()>;

    fn position(&self) -> f32;
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct MotorConfig {
    pub channel: u8,
    /// Motor is mounted backwards
    #[serde(default)]
    pub inverted: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ActuatorConfig {
    /// Serial port of the actuator board. Simulated actuators are used when missing.
    #[serde(default)]
    pub port: Option<String>,
    pub front_left: MotorConfig,
    pub front_right: MotorConfig,
    pub back_left: MotorConfig,
    pub back_right: MotorConfig,
    pub arm: MotorConfig,
    pub claw_channel: u8,
}

pub(crate) trait Clampable {
    fn clamp_num(self, first: Self, second: Self) -> Self;
}

impl Clampable for f32 {
    /// Clamp between two bounds given in any order. NaN becomes zero.
    fn clamp_num(self, first: f32, second: f32) -> f32 {
        let (min, max) = if first < second {
            (first, second)
        } else {
            (second, first)
        };
        if self.is_nan() {
            0.0_f32.clamp(min, max)
        } else {
            self.clamp(min, max)
        }
    }
}

/// Every actuator the teleop loop drives.
pub struct TeleopHardware {
    pub front_left: Box<dyn PowerOutput>,
    pub front_right: Box<dyn PowerOutput>,
    pub back_left: Box<dyn PowerOutput>,
    pub back_right: Box<dyn PowerOutput>,
    pub arm: Box<dyn PowerOutput>,
    pub claw: Box<dyn PositionOutput>,
}

impl TeleopHardware {
    pub fn simulated() -> Self {
        Self {
            front_left: Box::new(SimulatedMotor::new("front_left")),
            front_right: Box::new(SimulatedMotor::new("front_right")),
            back_left: Box::new(SimulatedMotor::new("back_left")),
            back_right: Box::new(SimulatedMotor::new("back_right")),
            arm: Box::new(SimulatedMotor::new("arm_motor")),
            claw: Box::new(SimulatedServo::new("claw_servo")),
        }
    }

    pub async fn send_wheels(&mut self, command: &HolonomicWheelCommand) -> Result<()> {
        self.front_left.set_power(command.front_left()).await?;
        self.front_right.set_power(command.front_right()).await?;
        self.back_left.set_power(command.back_left()).await?;
        self.back_right.set_power(command.back_right()).await?;
        Ok(())
    }

    pub fn wheel_powers(&self) -> HolonomicWheelCommand {
        HolonomicWheelCommand::new(
            self.front_left.power(),
            self.front_right.power(),
            self.back_left.power(),
            self.back_right.power(),
        )
    }

    /// Stop the wheels and the arm. The claw keeps its position.
    pub async fn stop(&mut self) -> Result<()> {
        self.send_wheels(&HolonomicWheelCommand::stopped()).await?;
        self.arm.set_power(0.0).await?;
        Ok(())
    }

    /// Stop after `result`, whatever it was. An error in `result` wins over a failed stop.
    pub async fn stop_after(&mut self, result: Result<()>) -> Result<()> {
        match (result, self.stop().await) {
            (Err(err), Err(stop_err)) => {
                error!("Failed to stop motors {:?}", stop_err);
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Ok(()), stop_result) => stop_result,
        }
    }
}

pub fn hardware_from_config(config: &ActuatorConfig, simulate: bool) -> Result<TeleopHardware> {
    match &config.port {
        Some(port) if !simulate => {
            info!("Opening actuator board on {}", port);
            let bus = SerialActuatorBus::open(port)?;
            Ok(TeleopHardware {
                front_left: Box::new(bus.motor(config.front_left)),
                front_right: Box::new(bus.motor(config.front_right)),
                back_left: Box::new(bus.motor(config.back_left)),
                back_right: Box::new(bus.motor(config.back_right)),
                arm: Box::new(bus.motor(config.arm)),
                claw: Box::new(bus.servo(config.claw_channel)),
            })
        }
        _ => {
            warn!("Using simulated actuators");
            Ok(TeleopHardware::simulated())
        }
    }
}
