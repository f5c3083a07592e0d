use config::Config;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::*;

use crate::{
    driver::ActuatorConfig,
    error::ErrorWrapper,
    gamepad::GamepadConfig,
    mechanism::{ArmConfig, ClawConfig},
    teleop::{ControlLoopConfig, DriveConfig},
};

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub actuators: ActuatorConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub arm: ArmConfig,
    #[serde(default)]
    pub claw: ClawConfig,
    #[serde(default)]
    pub gamepad: GamepadConfig,
    #[serde(default)]
    pub control_loop: ControlLoopConfig,
    #[serde(default)]
    pub zenoh: TeleopZenohConfig,
}

impl AppConfig {
    pub fn load_config(config: &Option<PathBuf>) -> anyhow::Result<Self> {
        let settings = if let Some(config) = config {
            info!("Using configuration from {:?}", config);
            Config::builder()
                .add_source(config::File::with_name(
                    config
                        .to_str()
                        .ok_or_else(|| anyhow::anyhow!("Failed to convert path"))?,
                ))
                .add_source(config::Environment::with_prefix("APP").separator("__"))
                .build()?
        } else {
            info!("Using dev configuration");
            Config::builder()
                .add_source(config::File::with_name("config/settings"))
                .add_source(config::File::with_name("config/dev_settings").required(false))
                .add_source(config::Environment::with_prefix("APP").separator("__"))
                .build()?
        };

        Ok(settings.try_deserialize()?)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct TeleopZenohConfig {
    #[serde(default)]
    pub connect: Vec<zenoh_config::EndPoint>,
    #[serde(default)]
    pub listen: Vec<zenoh_config::EndPoint>,
    #[serde(default)]
    pub config_path: Option<String>,
}

impl TeleopZenohConfig {
    pub fn get_zenoh_config(&self) -> anyhow::Result<zenoh::config::Config> {
        let mut config = if let Some(conf_file) = &self.config_path {
            zenoh::config::Config::from_file(conf_file).map_err(ErrorWrapper::ZenohError)?
        } else {
            zenoh::config::Config::default()
        };
        if !self.connect.is_empty() {
            config.connect.endpoints.clone_from(&self.connect);
        }
        if !self.listen.is_empty() {
            config.listen.endpoints.clone_from(&self.listen);
        }
        Ok(config)
    }
}
