//! Process supervisor.
//!
//! # States
//! ```text
//! Init → ConfigLoaded → ControllerStarted → ServiceBound → Listening
//!      → ShuttingDown → Terminated
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, no retries
//! - The listener is launched only after the controller reports Running
//! - The interrupt is the only wait after startup
//! - Shutdown signals the listener first, then stops the controller
//! - Cleanup errors are logged, never fatal

use std::fmt;
use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::api::{self, BindError};
use crate::cli::Cli;
use crate::config::{self, ConfigError};
use crate::controller::drivers::Board;
use crate::controller::{ChannelLayout, Controller, ControllerError, HardwareController};
use crate::lifecycle::Shutdown;
use crate::net::{Launcher, ListenerError};
use crate::VERSION;

/// Supervisor progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Init,
    ConfigLoaded,
    ControllerStarted,
    ServiceBound,
    Listening,
    ShuttingDown,
    Terminated,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SupervisorState::Init => "init",
            SupervisorState::ConfigLoaded => "config-loaded",
            SupervisorState::ControllerStarted => "controller-started",
            SupervisorState::ServiceBound => "service-bound",
            SupervisorState::Listening => "listening",
            SupervisorState::ShuttingDown => "shutting-down",
            SupervisorState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// How a successful run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// `-version` was given; nothing was started.
    Version,
    /// Stopped after an interrupt.
    Interrupted,
}

/// Fatal startup failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize controller: {0}")]
    Controller(#[from] ControllerError),

    #[error("failed to bind service: {0}")]
    Bind(#[from] BindError),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Drives the process from parsed flags to shutdown.
pub struct Supervisor<L> {
    cli: Cli,
    board: Arc<dyn Board>,
    launcher: L,
    state: SupervisorState,
    controller: Option<Arc<HardwareController>>,
    listener: Option<JoinHandle<Result<(), ListenerError>>>,
}

impl<L: Launcher> Supervisor<L> {
    pub fn new(cli: Cli, board: Arc<dyn Board>, launcher: L) -> Self {
        Self {
            cli,
            board,
            launcher,
            state: SupervisorState::Init,
            controller: None,
            listener: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// The controller, once constructed.
    pub fn controller(&self) -> Option<&Arc<HardwareController>> {
        self.controller.as_ref()
    }

    /// Take the listener task handle, once launched.
    pub fn take_listener(&mut self) -> Option<JoinHandle<Result<(), ListenerError>>> {
        self.listener.take()
    }

    /// Run startup, wait for `interrupt`, then shut down.
    ///
    /// `out` receives the version line when `-version` is set.
    pub async fn run<I, W>(&mut self, interrupt: I, out: &mut W) -> Result<Exit, StartupError>
    where
        I: Future<Output = ()>,
        W: Write,
    {
        if self.cli.version {
            writeln!(out, "{VERSION}")?;
            return Ok(Exit::Version);
        }

        let config = config::resolve(self.cli.config_path())?
            .apply_overrides(&self.cli.overrides());
        tracing::info!(
            config_file = ?self.cli.config_path(),
            port = config.port,
            auth_enabled = config.auth_enabled,
            "Configuration loaded"
        );
        self.transition(SupervisorState::ConfigLoaded);

        let controller = Arc::new(HardwareController::new(
            self.cli.capabilities(),
            self.board.clone(),
            ChannelLayout::from(&config),
        ));
        self.controller = Some(controller.clone());
        controller.start()?;
        self.transition(SupervisorState::ControllerStarted);

        let auth_enabled = config.auth_enabled;
        let service = match api::bind(config, controller.clone(), auth_enabled) {
            Ok(service) => service,
            Err(e) => {
                if let Err(stop_err) = controller.stop() {
                    tracing::warn!(error = %stop_err, "Controller cleanup failed");
                }
                return Err(e.into());
            }
        };
        self.transition(SupervisorState::ServiceBound);

        let shutdown = Shutdown::new();
        tracing::info!(address = %service.addr(), "Starting HTTP server");
        self.listener = Some(self.launcher.launch(service, shutdown.subscribe()));
        self.transition(SupervisorState::Listening);

        interrupt.await;
        self.transition(SupervisorState::ShuttingDown);

        shutdown.trigger();
        if let Err(e) = controller.stop() {
            tracing::warn!(error = %e, "Controller cleanup failed");
        }
        self.transition(SupervisorState::Terminated);

        Ok(Exit::Interrupted)
    }

    fn transition(&mut self, next: SupervisorState) {
        tracing::debug!(from = %self.state, to = %next, "Supervisor transition");
        self.state = next;
    }
}
