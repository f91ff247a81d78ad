//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! -config <path> (optional TOML)
//!     → loader.rs (read & deserialize, or defaults when absent)
//!     → schema.rs (ServerConfig::apply_overrides with CLI flags)
//!     → effective ServerConfig, owned by the supervisor
//!     → validation.rs (semantic checks when the service is bound)
//! ```
//!
//! # Design Decisions
//! - Precedence: defaults < file < explicit command-line flags
//! - All fields have defaults to allow minimal configs
//! - Unknown keys are parse errors, not silently ignored
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve, ConfigError};
pub use schema::{Overrides, ServerConfig, DEFAULT_PORT};
pub use validation::{validate_config, ValidationError};
