//! Network listener.
//!
//! # Responsibilities
//! - Bind the TCP socket for a bound service
//! - Serve the router until the shutdown broadcast fires
//! - Report bind and serve failures from inside the listener task
//!
//! # Design Decisions
//! - The listener runs on its own tokio task and never blocks the supervisor
//! - A bind failure is logged by the task; the supervisor does not observe it
//! - Graceful shutdown: stop accepting, let in-flight requests finish

use std::net::SocketAddr;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::api::BoundService;
use crate::lifecycle::shutdown;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// The server stopped with an I/O error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Something that can start serving a [`BoundService`].
pub trait Launcher {
    /// Start serving in the background and return immediately.
    fn launch(
        &self,
        service: BoundService,
        shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<Result<(), ListenerError>>;
}

/// Launches a TCP listener on the service's address.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpLauncher;

impl Launcher for TcpLauncher {
    fn launch(
        &self,
        service: BoundService,
        shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<Result<(), ListenerError>> {
        tokio::spawn(async move {
            let result = serve(service, shutdown).await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "HTTP listener failed");
            }
            result
        })
    }
}

/// Bind `service.addr()` and serve until shutdown.
pub async fn serve(
    service: BoundService,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), ListenerError> {
    let addr = service.addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind { addr, source })?;
    serve_on(listener, service.into_router(), shutdown).await
}

/// Serve `router` on an already bound listener until shutdown.
pub async fn serve_on(
    listener: TcpListener,
    router: Router,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), ListenerError> {
    let local_addr = listener.local_addr().map_err(ListenerError::Serve)?;
    tracing::info!(address = %local_addr, "Listening for connections");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown::notified(shutdown))
        .await
        .map_err(ListenerError::Serve)?;

    tracing::info!(address = %local_addr, "HTTP listener stopped");
    Ok(())
}
