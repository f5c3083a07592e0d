use anyhow::Result;
use clap::Parser;
use mecanum_teleop::{
    configuration::AppConfig,
    driver::{hardware_from_config, TeleopHardware},
    holonomic_controller::{HolonomicWheelCommand, MoveCommand},
    logging,
};
use std::{path::PathBuf, time::Duration};
use tokio::time::sleep;
use tracing::*;

/// Spin the wheels one at a time to check motor channels and directions
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// path to config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Power used for the test
    #[arg(long, default_value_t = 0.3)]
    power: f32,

    /// Also run a short forward and strafe move
    #[arg(long)]
    move_test: bool,

    /// Sets the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbosity: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_tracing(args.verbosity, false);
    let app_config = AppConfig::load_config(&args.config)?;
    let mut hardware = hardware_from_config(&app_config.actuators, false)?;

    let mut result = wheels_test(&mut hardware, args.power).await;
    if args.move_test && result.is_ok() {
        result = move_test(&mut hardware, args.power).await;
    }
    hardware.stop_after(result).await
}

async fn wheels_test(hardware: &mut TeleopHardware, power: f32) -> Result<()> {
    let steps = [
        ("Front left", HolonomicWheelCommand::new(power, 0.0, 0.0, 0.0)),
        ("Front right", HolonomicWheelCommand::new(0.0, power, 0.0, 0.0)),
        ("Back left", HolonomicWheelCommand::new(0.0, 0.0, power, 0.0)),
        ("Back right", HolonomicWheelCommand::new(0.0, 0.0, 0.0, power)),
    ];
    for (name, command) in steps {
        info!("{} forward", name);
        hardware.send_wheels(&command).await?;
        sleep(Duration::from_secs_f32(2.)).await;
    }
    info!("Stopping");
    hardware.stop().await?;
    sleep(Duration::from_secs_f32(1.)).await;
    Ok(())
}

async fn move_test(hardware: &mut TeleopHardware, power: f32) -> Result<()> {
    let moves = [
        ("Forward", MoveCommand::new(1.0, 0.0, 0.0)),
        ("Backward", MoveCommand::new(-1.0, 0.0, 0.0)),
        ("Strafe right", MoveCommand::new(0.0, 1.0, 0.0)),
        ("Strafe left", MoveCommand::new(0.0, -1.0, 0.0)),
        ("Rotate clockwise", MoveCommand::new(0.0, 0.0, 1.0)),
    ];
    for (name, move_command) in moves {
        info!("{}", name);
        hardware
            .send_wheels(&move_command.to_wheel_command(power))
            .await?;
        sleep(Duration::from_secs_f32(1.5)).await;
    }
    info!("Stopping");
    hardware.stop().await?;
    sleep(Duration::from_secs_f32(1.)).await;
    Ok(())
}
