//! Network layer.
//!
//! # Data Flow
//! ```text
//! BoundService (router + address)
//!     → listener.rs (TCP bind, axum::serve on a spawned task)
//!     → graceful shutdown on the lifecycle broadcast
//! ```

pub mod listener;

pub use listener::{Launcher, ListenerError, TcpLauncher};
