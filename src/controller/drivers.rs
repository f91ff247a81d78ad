//! Peripheral driver interfaces.
//!
//! The controller never addresses a bus directly; it asks a [`Board`] to
//! open each peripheral and keeps the returned handle for its running
//! lifetime. Concrete drivers (PCA9685 PWM, MCP3008 ADC, GPIO relays) live
//! behind these traits.

use std::fmt;

use thiserror::Error;

/// Usable GPIO lines for relays on a 40-pin header.
pub const MAX_RELAY_CHANNELS: u8 = 28;
/// Outputs on a PCA9685.
pub const MAX_PWM_CHANNELS: u8 = 16;
/// Inputs on an MCP3008.
pub const MAX_ADC_CHANNELS: u8 = 8;
/// Largest value a 10-bit conversion can return.
pub const ADC_MAX_VALUE: u16 = 1023;

/// Peripheral families managed by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Peripheral {
    Gpio,
    Pwm,
    Adc,
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Peripheral::Gpio => write!(f, "gpio"),
            Peripheral::Pwm => write!(f, "pwm"),
            Peripheral::Adc => write!(f, "adc"),
        }
    }
}

/// Electrical level of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Error type for driver operations.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("{0} bus unavailable")]
    BusUnavailable(Peripheral),

    #[error("{peripheral} supports at most {max} channels, {requested} requested")]
    TooManyChannels {
        peripheral: Peripheral,
        requested: u8,
        max: u8,
    },

    #[error("channel {0} not present")]
    NoSuchChannel(u8),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Factory for the peripherals of one physical (or simulated) board.
pub trait Board: Send + Sync {
    /// Human-readable board name for logs.
    fn name(&self) -> &str;

    fn open_gpio(&self, channels: u8) -> Result<Box<dyn GpioBank>, DriverError>;

    fn open_pwm(&self, channels: u8) -> Result<Box<dyn PwmDriver>, DriverError>;

    fn open_adc(&self, channels: u8) -> Result<Box<dyn AdcDriver>, DriverError>;
}

/// Output lines driving the relays.
pub trait GpioBank: Send {
    fn write(&mut self, pin: u8, level: Level) -> Result<(), DriverError>;

    fn read(&self, pin: u8) -> Result<Level, DriverError>;

    /// Release the lines. Consumes the handle.
    fn close(self: Box<Self>) -> Result<(), DriverError>;
}

pub trait PwmDriver: Send {
    /// Set a channel's duty cycle in percent (0..=100).
    fn set_duty(&mut self, channel: u8, percent: u8) -> Result<(), DriverError>;

    fn close(self: Box<Self>) -> Result<(), DriverError>;
}

pub trait AdcDriver: Send {
    /// Sample a channel; 10-bit result.
    fn read(&mut self, channel: u8) -> Result<u16, DriverError>;

    fn close(self: Box<Self>) -> Result<(), DriverError>;
}
