use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tokio::time::{interval, MissedTickBehavior};
use tracing::*;

use crate::{
    driver::TeleopHardware,
    gamepad::{SharedInput, TeleopInput},
    mechanism::{ArmAction, ArmConfig, ClawAction, ClawConfig},
    telemetry::{Telemetry, TelemetryFrame, TelemetryPublisher},
};

#[derive(Deserialize, Debug, Clone)]
pub struct DriveConfig {
    /// Operator speed limit applied to every wheel
    #[serde(default = "default_power_scale")]
    pub power_scale: f32,
}

fn default_power_scale() -> f32 {
    0.8
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            power_scale: default_power_scale(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ControlLoopConfig {
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,
}

fn default_tick_rate_hz() -> u32 {
    50
}

impl Default for ControlLoopConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate_hz(),
        }
    }
}

impl ControlLoopConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz.max(1) as f64)
    }
}

/// Mecanum base with an arm and a claw under direct operator control.
pub struct TeleopRobot {
    hardware: TeleopHardware,
    telemetry: Telemetry,
    drive: DriveConfig,
    arm: ArmConfig,
    claw: ClawConfig,
}

impl TeleopRobot {
    pub fn new(
        hardware: TeleopHardware,
        drive: DriveConfig,
        arm: ArmConfig,
        claw: ClawConfig,
    ) -> Self {
        Self {
            hardware,
            telemetry: Telemetry::default(),
            drive,
            arm,
            claw,
        }
    }

    pub fn hardware(&self) -> &TeleopHardware {
        &self.hardware
    }

    /// Stop every motor and park the claw.
    pub async fn init(&mut self) -> Result<TelemetryFrame> {
        self.hardware.stop().await?;
        self.hardware
            .claw
            .set_position(self.claw.initial_position)
            .await?;
        self.telemetry.add_data("Status", "Robot is ready to start!");
        info!("Robot initialized");
        Ok(self.telemetry.update())
    }

    /// One control cycle.
    pub async fn step(&mut self, input: &TeleopInput) -> Result<TelemetryFrame> {
        let wheels = input
            .move_command()
            .to_wheel_command(self.drive.power_scale);
        self.hardware.send_wheels(&wheels).await?;

        let arm_action = ArmAction::resolve(input.right_bumper, input.right_trigger, &self.arm);
        self.hardware.arm.set_power(arm_action.power(&self.arm)).await?;

        let claw_action = ClawAction::resolve(input.a, input.b);
        if let Some(position) = claw_action.target_position(&self.claw) {
            self.hardware.claw.set_position(position).await?;
        }

        self.telemetry
            .add_data("Drive Power", format!("{:.2}", self.drive.power_scale));
        self.telemetry.add_data(
            "Left Stick",
            format!("X: {:.2}, Y: {:.2}", input.left_stick_x, input.left_stick_y),
        );
        self.telemetry
            .add_data("Right Stick X", format!("{:.2}", input.right_stick_x));
        self.telemetry
            .add_data("Arm Power", format!("{:.2}", self.hardware.arm.power()));
        self.telemetry.add_data(
            "Claw Position",
            format!("{:.2}", self.hardware.claw.position()),
        );
        self.telemetry
            .add_data("Controls", "Left stick: drive, Right stick: turn");
        self.telemetry
            .add_data("Arm", "Right bumper: up, Right trigger: down");
        self.telemetry.add_data("Claw", "A: close, B: open");
        Ok(self.telemetry.update())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.shutdown_after(Ok(())).await
    }

    /// Stop all motors once the loop ended, keeping the loop's error if it had one.
    pub async fn shutdown_after(&mut self, result: Result<()>) -> Result<()> {
        info!("Stopping all motors");
        self.hardware.stop_after(result).await
    }
}

/// Drive the robot from the latest input at a fixed rate. Runs until an actuator fails.
pub async fn run_teleop_loop(
    robot: &mut TeleopRobot,
    input: &SharedInput,
    config: &ControlLoopConfig,
    publisher: &TelemetryPublisher,
) -> Result<()> {
    let mut ticker = interval(config.tick_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut input_lost = true;
    loop {
        ticker.tick().await;
        let teleop_input = match input.latest().await {
            Some(teleop_input) => {
                if input_lost {
                    info!("Gamepad input received");
                    input_lost = false;
                }
                teleop_input
            }
            None => {
                if !input_lost {
                    warn!("Gamepad input lost, stopping");
                    input_lost = true;
                }
                TeleopInput::neutral()
            }
        };
        let frame = robot.step(&teleop_input).await?;
        publisher.publish(&frame).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holonomic_controller::HolonomicWheelCommand;
    use approx::assert_relative_eq;

    fn robot() -> TeleopRobot {
        TeleopRobot::new(
            TeleopHardware::simulated(),
            DriveConfig::default(),
            ArmConfig::default(),
            ClawConfig::default(),
        )
    }

    #[tokio::test]
    async fn init_parks_claw() {
        let mut robot = robot();
        let frame = robot.init().await.unwrap();
        assert_eq!(frame.get("Status"), Some("Robot is ready to start!"));
        assert_relative_eq!(robot.hardware().claw.position(), 0.5);
        assert_eq!(
            robot.hardware().wheel_powers(),
            HolonomicWheelCommand::stopped()
        );
    }

    #[tokio::test]
    async fn full_forward_is_scaled() {
        let mut robot = robot();
        let input = TeleopInput {
            left_stick_y: 1.0,
            ..Default::default()
        };
        robot.step(&input).await.unwrap();
        for power in robot.hardware().wheel_powers().as_array() {
            assert_relative_eq!(power, 0.8);
        }
    }

    #[tokio::test]
    async fn neutral_input_stops() {
        let mut robot = robot();
        robot
            .step(&TeleopInput {
                left_stick_x: 1.0,
                right_bumper: true,
                ..Default::default()
            })
            .await
            .unwrap();
        robot.step(&TeleopInput::neutral()).await.unwrap();
        assert_eq!(
            robot.hardware().wheel_powers(),
            HolonomicWheelCommand::stopped()
        );
        assert_relative_eq!(robot.hardware().arm.power(), 0.0);
    }

    #[tokio::test]
    async fn arm_follows_bumper_and_trigger() {
        let mut robot = robot();
        robot
            .step(&TeleopInput {
                right_bumper: true,
                right_trigger: 1.0,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_relative_eq!(robot.hardware().arm.power(), 0.5);
        robot
            .step(&TeleopInput {
                right_trigger: 0.6,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_relative_eq!(robot.hardware().arm.power(), -0.5);
    }

    #[tokio::test]
    async fn claw_holds_last_position() {
        let mut robot = robot();
        robot.init().await.unwrap();
        robot
            .step(&TeleopInput {
                a: true,
                b: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_relative_eq!(robot.hardware().claw.position(), 0.2);
        robot.step(&TeleopInput::neutral()).await.unwrap();
        assert_relative_eq!(robot.hardware().claw.position(), 0.2);
        robot
            .step(&TeleopInput {
                b: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_relative_eq!(robot.hardware().claw.position(), 0.7);
    }

    #[tokio::test]
    async fn step_reports_telemetry() {
        let mut robot = robot();
        let frame = robot
            .step(&TeleopInput {
                left_stick_x: 0.5,
                left_stick_y: -0.25,
                right_bumper: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(frame.get("Drive Power"), Some("0.80"));
        assert_eq!(frame.get("Left Stick"), Some("X: 0.50, Y: -0.25"));
        assert_eq!(frame.get("Arm Power"), Some("0.50"));
        assert_eq!(frame.get("Claw"), Some("A: close, B: open"));
        assert!(frame.get("Status").is_none());
    }

    #[tokio::test]
    async fn shutdown_stops_motors() {
        let mut robot = robot();
        robot
            .step(&TeleopInput {
                left_stick_y: 1.0,
                right_bumper: true,
                ..Default::default()
            })
            .await
            .unwrap();
        robot.shutdown().await.unwrap();
        assert_eq!(
            robot.hardware().wheel_powers(),
            HolonomicWheelCommand::stopped()
        );
        assert_relative_eq!(robot.hardware().arm.power(), 0.0);
    }

    #[tokio::test]
    async fn loop_stops_when_input_goes_stale() {
        let mut robot = robot();
        let input = SharedInput::new(Duration::from_millis(100));
        let config = ControlLoopConfig { tick_rate_hz: 100 };
        let publisher = TelemetryPublisher::log_only();
        input
            .set(TeleopInput {
                left_stick_y: 1.0,
                ..Default::default()
            })
            .await;

        let elapsed = tokio::time::timeout(
            Duration::from_millis(30),
            run_teleop_loop(&mut robot, &input, &config, &publisher),
        )
        .await;
        assert!(elapsed.is_err());
        for power in robot.hardware().wheel_powers().as_array() {
            assert_relative_eq!(power, 0.8);
        }

        let elapsed = tokio::time::timeout(
            Duration::from_millis(300),
            run_teleop_loop(&mut robot, &input, &config, &publisher),
        )
        .await;
        assert!(elapsed.is_err());
        assert_eq!(
            robot.hardware().wheel_powers(),
            HolonomicWheelCommand::stopped()
        );
    }

    #[tokio::test]
    async fn shutdown_after_keeps_loop_error() {
        let mut robot = robot();
        robot
            .step(&TeleopInput {
                left_stick_y: 1.0,
                ..Default::default()
            })
            .await
            .unwrap();
        let result = robot
            .shutdown_after(Err(anyhow::anyhow!("actuator link lost")))
            .await;
        assert_eq!(result.unwrap_err().to_string(), "actuator link lost");
        assert_eq!(
            robot.hardware().wheel_powers(),
            HolonomicWheelCommand::stopped()
        );
    }

    #[test]
    fn tick_period_from_rate() {
        let config = ControlLoopConfig { tick_rate_hz: 50 };
        assert_eq!(config.tick_period(), Duration::from_millis(20));
        let config = ControlLoopConfig { tick_rate_hz: 0 };
        assert_eq!(config.tick_period(), Duration::from_secs(1));
    }
}
