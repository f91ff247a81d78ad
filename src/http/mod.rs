//! HTTP plumbing shared by the API router.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::listener)
//!     → request.rs (assign x-request-id)
//!     → tower-http trace / timeout / body limit
//!     → api handlers
//! ```

pub mod request;

pub use request::{request_span, UuidRequestId, X_REQUEST_ID};
