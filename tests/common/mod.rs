//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reefpi::api::BoundService;
use reefpi::cli::Cli;
use reefpi::controller::LifecycleState;
use reefpi::lifecycle::shutdown;
use reefpi::net::{Launcher, ListenerError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// What a [`RecordingLauncher`] saw when asked to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub addr: SocketAddr,
    pub auth_enabled: bool,
    pub controller_state: LifecycleState,
}

/// Launcher that records launches instead of opening sockets.
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    launches: Arc<Mutex<Vec<Launch>>>,
}

impl RecordingLauncher {
    pub fn launches(&self) -> Vec<Launch> {
        self.launches.lock().unwrap().clone()
    }
}

impl Launcher for RecordingLauncher {
    fn launch(
        &self,
        service: BoundService,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<Result<(), ListenerError>> {
        self.launches.lock().unwrap().push(Launch {
            addr: service.addr(),
            auth_enabled: service.auth_enabled(),
            controller_state: service.controller().state(),
        });
        tokio::spawn(async move {
            shutdown::notified(shutdown_rx).await;
            Ok(())
        })
    }
}

/// Parse flags the way `main` does.
pub fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["reefpi"];
    argv.extend_from_slice(args);
    Cli::parse_args(argv).unwrap()
}

/// Write a TOML config file that lives as long as the handle.
pub fn config_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// Ask the OS for a currently free local port.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Poll `url` until it answers or two seconds pass.
pub async fn wait_until_ready(client: &reqwest::Client, url: &str) {
    for _ in 0..40 {
        if client.get(url).send().await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("server at {url} never became ready");
}
