use super::{Clampable, PositionOutput, PowerOutput};
use anyhow::Result;
use async_trait::async_trait;
use tracing::*;

/// Motor that only remembers what it was told.
#[derive(Debug, Clone)]
pub struct SimulatedMotor {
    name: String,
    power: f32,
}

impl SimulatedMotor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            power: 0.0,
        }
    }
}

#[async_trait]
impl PowerOutput for SimulatedMotor {
    async fn set_power(&mut self, power: f32) -> Result<()> {
        self.power = power.clamp_num(-1.0, 1.0);
        trace!(motor = %self.name, power = self.power, "Simulated motor power");
        Ok(())
    }

    fn power(&self) -> f32 {
        self.power
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedServo {
    name: String,
    position: f32,
}

impl SimulatedServo {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            position: 0.0,
        }
    }
}

#[async_trait]
impl PositionOutput for SimulatedServo {
    async fn set_position(&mut self, position: f32) -> Result<()> {
        self.position = position.clamp_num(0.0, 1.0);
        trace!(servo = %self.name, position = self.position, "Simulated servo position");
        Ok(())
    }

    fn position(&self) -> f32 {
        self.position
    }
}
