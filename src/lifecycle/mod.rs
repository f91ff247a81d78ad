//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (supervisor.rs):
//!     Resolve config → Start controller → Bind service → Launch listener
//!
//! Shutdown (shutdown.rs):
//!     Interrupt received → Stop accepting → Stop controller → Exit
//!
//! Signals (signals.rs):
//!     SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then hardware, then listeners
//! - Ordered shutdown: stop accept, then quiesce hardware
//! - No shutdown deadline: the process waits for the controller to stop

pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use shutdown::Shutdown;
pub use supervisor::{Exit, StartupError, Supervisor, SupervisorState};
