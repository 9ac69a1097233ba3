use std::path::PathBuf;

use sandbox_process::ManagedChild;
use sandbox_types::{Credentials, SupervisorConfig};

use crate::state::RuntimeState;

/// The in-sandbox PID 1. Owns both supervised children and the state
/// channels every background task (health prober, monitor loop, signal
/// listener) reads from.
///
/// `agent`/`bridge` are written only by the startup routine and the monitor
/// loop (both run on the same task), matching the spec's "no external lock
/// required if handles are swapped atomically on restart" resource note.
pub struct Supervisor {
    pub(crate) config: SupervisorConfig,
    pub(crate) state: RuntimeState,
    pub(crate) workdir: PathBuf,
    pub(crate) agent: Option<ManagedChild>,
    pub(crate) bridge: Option<ManagedChild>,
    pub(crate) http: reqwest::Client,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, workspace_root: PathBuf) -> Self {
        let workdir = match (&config.repo_name, &config.repo_owner) {
            (Some(name), Some(_)) => workspace_root.join(name),
            _ => workspace_root,
        };

        Self {
            config,
            state: RuntimeState::new(),
            workdir,
            agent: None,
            bridge: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn state(&self) -> RuntimeState {
        self.state.clone()
    }

    /// Mints a fresh repository-access token, preferring a pre-issued one
    /// over minting from App credentials. Returns `None` on missing
    /// credentials or a minting failure — both are non-fatal to the caller
    /// (clones fall back to an unauthenticated URL for public repos).
    pub(crate) async fn github_token(&self) -> Option<String> {
        match &self.config.credentials {
            Some(Credentials::Preissued(token)) => Some(token.clone()),
            Some(Credentials::App {
                app_id,
                private_key,
                installation_id,
            }) => sandbox_auth::generate_installation_token(&self.http, app_id, private_key, installation_id)
                .await
                .inspect_err(|e| tracing::error!(error = %e, "github.token_generation_error"))
                .ok(),
            None => None,
        }
    }
}
