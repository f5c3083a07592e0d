use anyhow::Result;
use clap::Parser;
use mecanum_teleop::{
    configuration,
    driver::hardware_from_config,
    error::ErrorWrapper,
    gamepad::{start_gamepad_listener, SharedInput},
    logging,
    telemetry::TelemetryPublisher,
    teleop::{run_teleop_loop, TeleopRobot},
};
use std::path::PathBuf;
use tracing::*;
use zenoh::prelude::r#async::*;

#[derive(Parser, Debug)]
#[command(version, about = "Mecanum robot teleop")]
struct Args {
    /// path to config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use simulated actuators even if a serial port is configured
    #[arg(long)]
    simulate: bool,

    /// Log as json
    #[arg(long)]
    json: bool,

    /// Sets the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbosity: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::setup_tracing(args.verbosity, args.json);

    let app_config = configuration::AppConfig::load_config(&args.config)?;

    let hardware = hardware_from_config(&app_config.actuators, args.simulate)?;
    let mut robot = TeleopRobot::new(
        hardware,
        app_config.drive.clone(),
        app_config.arm.clone(),
        app_config.claw.clone(),
    );
    let init_frame = robot.init().await?;

    // zenoh
    let zenoh_config = app_config.zenoh.get_zenoh_config()?;
    let zenoh_session = zenoh::open(zenoh_config)
        .res()
        .await
        .map_err(ErrorWrapper::ZenohError)?
        .into_arc();

    let publisher = TelemetryPublisher::new(zenoh_session.clone());
    publisher.publish(&init_frame).await;

    let input = SharedInput::new(app_config.gamepad.input_timeout());
    start_gamepad_listener(zenoh_session, input.clone(), app_config.gamepad.clone()).await?;

    let result = tokio::select! {
        result = run_teleop_loop(&mut robot, &input, &app_config.control_loop, &publisher) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received ctrl-c");
            Ok(())
        }
    };

    robot.shutdown_after(result).await
}
