use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sandbox_supervisor::{spawn_signal_listener, Supervisor};
use sandbox_types::SupervisorConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Sandbox supervisor: bootstraps the workspace, launches the agent server
/// and control-plane bridge, and keeps them alive.
#[derive(Debug, Parser)]
#[command(name = "sandbox-supervisor")]
struct Cli {
    /// Root directory the repository is cloned into (or pre-mounted at).
    #[arg(long, default_value = "/workspace")]
    workspace_root: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match SupervisorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "supervisor.config_error");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "supervisor.runtime_init_error");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async move {
        let supervisor = Supervisor::new(config, cli.workspace_root);
        let signal_task = spawn_signal_listener(supervisor.state());
        supervisor.run().await;
        signal_task.abort();
    });

    ExitCode::SUCCESS
}
