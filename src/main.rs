use std::process::ExitCode;
use std::sync::Arc;

use reefpi::cli::Cli;
use reefpi::controller::SimulatedBoard;
use reefpi::lifecycle::{signals, Supervisor};
use reefpi::net::TcpLauncher;
use reefpi::observability::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args(std::env::args_os()).unwrap_or_else(|e| e.exit());

    logging::init();

    let board = Arc::new(SimulatedBoard::new());
    let mut supervisor = Supervisor::new(cli, board, TcpLauncher);

    let mut stdout = std::io::stdout();
    let result = supervisor.run(signals::interrupt(), &mut stdout).await;

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, state = %supervisor.state(), "Fatal startup error");
            eprintln!("reefpi: {e}");
            ExitCode::FAILURE
        }
    }
}
