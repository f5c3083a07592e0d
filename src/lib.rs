#![doc = include_str!("../README.md")]
pub mod configuration;
pub mod driver;
pub mod error;
pub mod gamepad;
pub mod holonomic_controller;
pub mod logging;
pub mod mechanism;
pub mod telemetry;
pub mod teleop;
