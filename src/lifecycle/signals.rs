//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for the process interrupt (SIGINT / Ctrl+C)
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A single awaited future, consumed once per shutdown cycle

/// Resolve when the process receives an interrupt.
///
/// If the handler cannot be installed the future never resolves; the
/// default disposition of SIGINT still terminates the process.
pub async fn interrupt() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install interrupt handler");
            std::future::pending::<()>().await;
        }
    }
}
