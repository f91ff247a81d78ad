//! reefpi controller daemon library.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv ──▶ cli ──▶ config (file + overrides) ──▶ controller.start()
//!                                                      │
//!                                                      ▼
//!   Ctrl+C ──▶ lifecycle::supervisor ◀── net::listener ◀── api::bind
//!                     │
//!                     ▼
//!               controller.stop() ──▶ exit
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod controller;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use cli::Cli;
pub use config::ServerConfig;
pub use controller::{Controller, HardwareCapabilities, HardwareController};
pub use lifecycle::{Exit, Shutdown, StartupError, Supervisor};

/// Version reported by `-version`, injected at build time via
/// `REEFPI_VERSION` and defaulting to the package version.
pub const VERSION: &str = match option_env!("REEFPI_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
