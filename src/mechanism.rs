//! Arm and claw control.

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct ArmConfig {
    /// Power used when raising or lowering
    #[serde(default = "default_arm_power")]
    pub power: f32,
    /// Trigger value that has to be exceeded to lower the arm
    #[serde(default = "default_trigger_threshold")]
    pub trigger_threshold: f32,
}

fn default_arm_power() -> f32 {
    0.5
}

fn default_trigger_threshold() -> f32 {
    0.1
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            power: default_arm_power(),
            trigger_threshold: default_trigger_threshold(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmAction {
    Raise,
    Lower,
    Idle,
}

impl ArmAction {
    /// Bumper wins over trigger, trigger wins over idle.
    pub fn resolve(bumper: bool, trigger: f32, config: &ArmConfig) -> Self {
        if bumper {
            ArmAction::Raise
        } else if trigger > config.trigger_threshold {
            ArmAction::Lower
        } else {
            ArmAction::Idle
        }
    }

    pub fn power(&self, config: &ArmConfig) -> f32 {
        let power = config.power.clamp(0.0, 1.0);
        match self {
            ArmAction::Raise => power,
            ArmAction::Lower => -power,
            ArmAction::Idle => 0.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ClawConfig {
    #[serde(default = "default_open_position")]
    pub open_position: f32,
    #[serde(default = "default_closed_position")]
    pub closed_position: f32,
    /// Position commanded on init
    #[serde(default = "default_initial_position")]
    pub initial_position: f32,
}

fn default_open_position() -> f32 {
    0.7
}

fn default_closed_position() -> f32 {
    0.2
}

fn default_initial_position() -> f32 {
    0.5
}

impl Default for ClawConfig {
    fn default() -> Self {
        Self {
            open_position: default_open_position(),
            closed_position: default_closed_position(),
            initial_position: default_initial_position(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClawAction {
    Close,
    Open,
    /// Leave the servo where it was last commanded
    Hold,
}

impl ClawAction {
    /// Close wins over open.
    pub fn resolve(close: bool, open: bool) -> Self {
        if close {
            ClawAction::Close
        } else if open {
            ClawAction::Open
        } else {
            ClawAction::Hold
        }
    }

    pub fn target_position(&self, config: &ClawConfig) -> Option<f32> {
        match self {
            ClawAction::Close => Some(config.closed_position.clamp(0.0, 1.0)),
            ClawAction::Open => Some(config.open_position.clamp(0.0, 1.0)),
            ClawAction::Hold => None,
        }
    }
}
