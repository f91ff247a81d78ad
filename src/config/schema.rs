//! Configuration schema definitions.
//!
//! `ServerConfig` is the effective configuration of the controller daemon.
//! It is deserialized from an optional TOML file and then merged with the
//! command-line overrides; every field has a default so a missing file or a
//! partial file are both valid.

use std::net::{AddrParseError, IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Default HTTP port when neither the file nor `-port` sets one.
pub const DEFAULT_PORT: u16 = 8080;

/// Effective server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// IP address the HTTP listener binds to (e.g., "0.0.0.0").
    pub interface: String,

    /// HTTP listening port.
    pub port: u16,

    /// Require a bearer token on the API.
    pub auth_enabled: bool,

    /// Bearer tokens accepted when authentication is enabled.
    pub api_tokens: Vec<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Number of relay outputs wired to the GPIO bank.
    pub relay_channels: u8,

    /// Number of PWM outputs exposed by the PWM driver.
    pub pwm_channels: u8,

    /// Number of ADC inputs exposed by the ADC driver.
    pub adc_channels: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            interface: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            auth_enabled: true,
            api_tokens: Vec::new(),
            request_timeout_secs: 30,
            relay_channels: 8,
            pwm_channels: 16,
            adc_channels: 8,
        }
    }
}

/// Settings taken from the command line that win over the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    /// `-port`, when given explicitly.
    pub port: Option<u16>,
    /// `-no-auth`. Can only turn authentication off.
    pub no_auth: bool,
}

impl ServerConfig {
    /// Merge command-line overrides on top of this configuration.
    pub fn apply_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if overrides.no_auth {
            self.auth_enabled = false;
        }
        self
    }

    /// Socket address the listener should bind to.
    pub fn listen_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.interface.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
