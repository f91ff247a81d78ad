//! Hardware controller subsystem.
//!
//! # Data Flow
//! ```text
//! -pwm / -adc / -high
//!     → HardwareCapabilities (immutable)
//!     → HardwareController::new(capabilities, board, layout)
//!     → start(): open gpio, then pwm/adc when enabled
//!     → handlers call relay/pwm/adc operations while Running
//!     → stop(): quiesce outputs, release drivers
//! ```
//!
//! # Design Decisions
//! - One controller per process, shared as `Arc<dyn Controller>`
//! - Lifecycle is Uninitialized → Running → Stopped, never backwards
//! - A failed start releases whatever it opened and stays Uninitialized
//! - Every peripheral operation checks the lifecycle state first

pub mod drivers;
pub mod hardware;
pub mod sim;

use std::fmt;

use thiserror::Error;

use crate::config::ServerConfig;
use self::drivers::{DriverError, Peripheral};

pub use hardware::HardwareController;
pub use sim::SimulatedBoard;

/// Peripheral toggles captured from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HardwareCapabilities {
    /// Drive the PWM controller.
    pub pwm_enabled: bool,
    /// Sample the ADC.
    pub adc_enabled: bool,
    /// Relays energize on a high GPIO level.
    pub relay_active_high: bool,
}

/// Channel counts for each peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    pub relays: u8,
    pub pwm: u8,
    pub adc: u8,
}

impl From<&ServerConfig> for ChannelLayout {
    fn from(config: &ServerConfig) -> Self {
        Self {
            relays: config.relay_channels,
            pwm: config.pwm_channels,
            adc: config.adc_channels,
        }
    }
}

impl Default for ChannelLayout {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

/// Controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Running,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Uninitialized => write!(f, "uninitialized"),
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Error type for controller operations.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("failed to initialize {peripheral}: {source}")]
    Init {
        peripheral: Peripheral,
        #[source]
        source: DriverError,
    },

    #[error("cannot {operation} a controller that is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: LifecycleState,
    },

    #[error("controller is not running")]
    NotRunning,

    #[error("{0} support is disabled")]
    Disabled(Peripheral),

    #[error("{peripheral} channel {channel} out of range (0..{available})")]
    InvalidChannel {
        peripheral: Peripheral,
        channel: u32,
        available: u8,
    },

    #[error("duty cycle {0}% out of range (0..=100)")]
    InvalidDuty(u32),

    #[error("{peripheral} driver error: {source}")]
    Driver {
        peripheral: Peripheral,
        #[source]
        source: DriverError,
    },

    #[error("cleanup failed: {}", describe_failures(.0))]
    Shutdown(Vec<(Peripheral, DriverError)>),
}

fn describe_failures(failures: &[(Peripheral, DriverError)]) -> String {
    failures
        .iter()
        .map(|(peripheral, err)| format!("{peripheral}: {err}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Interface the rest of the process uses to reach the hardware.
pub trait Controller: Send + Sync + 'static {
    /// Initialize every enabled peripheral. Called once per process.
    fn start(&self) -> Result<(), ControllerError>;

    /// Quiesce and release peripherals. Called once, after `start`.
    fn stop(&self) -> Result<(), ControllerError>;

    fn state(&self) -> LifecycleState;

    fn capabilities(&self) -> HardwareCapabilities;

    fn layout(&self) -> ChannelLayout;

    /// Whether a relay is currently energized.
    fn relay(&self, channel: u32) -> Result<bool, ControllerError>;

    fn set_relay(&self, channel: u32, on: bool) -> Result<(), ControllerError>;

    /// Set a PWM channel's duty cycle in percent.
    fn set_pwm(&self, channel: u32, percent: u32) -> Result<(), ControllerError>;

    fn read_adc(&self, channel: u32) -> Result<u16, ControllerError>;
}
