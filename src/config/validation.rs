//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the listen interface is an IP address
//! - Check channel counts fit the peripherals
//! - Reject empty API tokens
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs when the service is bound, not when the file is parsed

use std::net::IpAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::controller::drivers::{MAX_ADC_CHANNELS, MAX_PWM_CHANNELS, MAX_RELAY_CHANNELS};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("interface {0:?} is not an IP address")]
    InvalidInterface(String),

    #[error("api_tokens[{0}] is empty")]
    EmptyToken(usize),

    #[error("{field} must be between 1 and {max}, got {value}")]
    ChannelCount {
        field: &'static str,
        value: u8,
        max: u8,
    },

    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

/// Check a configuration for conflicting or out-of-range values.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.interface.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidInterface(config.interface.clone()));
    }

    for (index, token) in config.api_tokens.iter().enumerate() {
        if token.trim().is_empty() {
            errors.push(ValidationError::EmptyToken(index));
        }
    }

    let counts = [
        ("relay_channels", config.relay_channels, MAX_RELAY_CHANNELS),
        ("pwm_channels", config.pwm_channels, MAX_PWM_CHANNELS),
        ("adc_channels", config.adc_channels, MAX_ADC_CHANNELS),
    ];
    for (field, value, max) in counts {
        if value == 0 || value > max {
            errors.push(ValidationError::ChannelCount { field, value, max });
        }
    }

    if config.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
