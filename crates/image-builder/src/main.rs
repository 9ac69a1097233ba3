use std::collections::HashMap;
use std::process::ExitCode;

use clap::Parser;
use sandbox_image_builder::{BuildWorker, BuilderConfig};
use sandbox_provider::HttpSandboxProvider;
use sandbox_types::BuildRequest;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// One-shot image-builder invocation: the control plane spawns this binary
/// once per build request rather than keeping a long-lived worker around,
/// matching the Python original's "spawn a function, let it run to
/// completion" model.
#[derive(Debug, Parser)]
#[command(name = "sandbox-image-builder")]
struct Cli {
    /// Build identifier from the control plane. Required and non-empty —
    /// an unidentifiable build has nowhere to route its callback.
    #[arg(long)]
    build_id: String,

    #[arg(long)]
    repo_owner: String,

    #[arg(long)]
    repo_name: String,

    #[arg(long, default_value = "main")]
    default_branch: String,

    /// URL to POST the success payload to. The failure payload goes to the
    /// same URL with `/build-complete` replaced by `/build-failed`.
    #[arg(long, default_value = "")]
    callback_url: String,

    /// Repeatable `KEY=VALUE` environment override forwarded into the build
    /// sandbox.
    #[arg(long = "env", value_parser = parse_env_override)]
    env_overrides: Vec<(String, String)>,
}

fn parse_env_override(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if cli.build_id.trim().is_empty() {
        error!("image_builder.config_error error=\"build_id must be non-empty\"");
        return ExitCode::FAILURE;
    }

    let config = match BuilderConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "image_builder.config_error");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "image_builder.runtime_init_error");
            return ExitCode::FAILURE;
        }
    };

    let provider = HttpSandboxProvider::new(config.provider_url.clone());
    let worker = match BuildWorker::new(provider, &config) {
        Ok(worker) => worker,
        Err(e) => {
            error!(error = %e, "image_builder.worker_init_error");
            return ExitCode::FAILURE;
        }
    };

    let env_overrides: HashMap<String, String> = cli.env_overrides.into_iter().collect();
    let request = BuildRequest {
        build_id: cli.build_id,
        repo_owner: cli.repo_owner,
        repo_name: cli.repo_name,
        default_branch: cli.default_branch,
        callback_url: cli.callback_url,
        env_overrides: if env_overrides.is_empty() {
            None
        } else {
            Some(env_overrides)
        },
    };

    runtime.block_on(worker.build(request));

    ExitCode::SUCCESS
}
