use super::{Clampable, MotorConfig, PositionOutput, PowerOutput};
use anyhow::Error;
use anyhow::Result;
use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use futures::SinkExt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_serial::SerialPortBuilderExt;
use tokio_util::codec::{Decoder, Encoder, Framed};

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ActuatorError {
    #[error("communication with actuator board failed")]
    CommError,
    #[error("failed opening serial port {0}")]
    FailedOpeningSerialPort(String),
}

const POWER_COMMAND: u8 = 0;
const POSITION_COMMAND: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WireCommand {
    Power { channel: u8, power: f32 },
    Position { channel: u8, position: f32 },
}

impl WireCommand {
    fn encode(&self) -> Vec<u8> {
        fn magnitude(value: f32) -> u8 {
            (value.abs().clamp_num(0.0, 1.0) * 255.0).round() as u8
        }

        // [kind, channel, direction, magnitude]
        let buffer = match *self {
            WireCommand::Power { channel, power } => [
                POWER_COMMAND,
                channel,
                (power > 0.0) as u8,
                magnitude(power),
            ],
            WireCommand::Position { channel, position } => [
                POSITION_COMMAND,
                channel,
                (position > 0.0) as u8,
                magnitude(position),
            ],
        };

        let mut encoded = postcard_cobs::encode_vec(&buffer);
        encoded.push(0);
        encoded
    }
}

pub struct ActuatorProtocol;

impl Decoder for ActuatorProtocol {
    type Item = ();
    type Error = Error;

    fn decode(&mut self, _: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(None)
    }
}

impl Encoder<WireCommand> for ActuatorProtocol {
    type Error = Error;

    fn encode(&mut self, data: WireCommand, buf: &mut BytesMut) -> Result<(), Error> {
        let encoded_data = data.encode();
        buf.reserve(encoded_data.len());
        buf.put_slice(&encoded_data);
        Ok(())
    }
}

type SharedPort = Arc<Mutex<Framed<tokio_serial::SerialStream, ActuatorProtocol>>>;

const BAUD_RATE: u32 = 115200;

/// Serial link to the board every motor and servo hangs off.
pub struct SerialActuatorBus {
    framed_port: SharedPort,
}

impl SerialActuatorBus {
    pub fn open(port: &str) -> Result<Self> {
        let serial_port = tokio_serial::new(port, BAUD_RATE)
            .open_native_async()
            .map_err(|_| ActuatorError::FailedOpeningSerialPort(port.to_owned()))?;
        Ok(Self {
            framed_port: Arc::new(Mutex::new(ActuatorProtocol.framed(serial_port))),
        })
    }

    pub fn motor(&self, config: MotorConfig) -> SerialMotor {
        SerialMotor {
            framed_port: self.framed_port.clone(),
            config,
            power: 0.0,
        }
    }

    pub fn servo(&self, channel: u8) -> SerialServo {
        SerialServo {
            framed_port: self.framed_port.clone(),
            channel,
            position: 0.0,
        }
    }
}

async fn send(port: &SharedPort, command: WireCommand) -> Result<()> {
    port.lock()
        .await
        .send(command)
        .await
        .map_err(|_| ActuatorError::CommError)?;
    Ok(())
}

pub struct SerialMotor {
    framed_port: SharedPort,
    config: MotorConfig,
    power: f32,
}

#[async_trait]
impl PowerOutput for SerialMotor {
    async fn set_power(&mut self, power: f32) -> Result<()> {
        let power = power.clamp_num(-1.0, 1.0);
        let inversion_mul = if self.config.inverted { -1.0 } else { 1.0 };
        send(
            &self.framed_port,
            WireCommand::Power {
                channel: self.config.channel,
                power: power * inversion_mul,
            },
        )
        .await?;
        self.power = power;
        Ok(())
    }

    fn power(&self) -> f32 {
        self.power
    }
}

pub struct SerialServo {
    framed_port: SharedPort,
    channel: u8,
    position: f32,
}

#[async_trait]
impl PositionOutput for SerialServo {
    async fn set_position(&mut self, position: f32) -> Result<()> {
        let position = position.clamp_num(0.0, 1.0);
        send(
            &self.framed_port,
            WireCommand::Position {
                channel: self.channel,
                position,
            },
        )
        .await?;
        self.position = position;
        Ok(())
    }

    fn position(&self) -> f32 {
        self.position
    }
}
