use std::env;

use crate::constants::{DEFAULT_AGENT_PORT, DEFAULT_SETUP_TIMEOUT_SECONDS};
use url::Url;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} is set but not a valid URL: {source}")]
    InvalidUrl {
        field: &'static str,
        source: String,
    },
}

/// Which workspace-acquisition path the supervisor takes in P1. Most
/// deployments clone the repo themselves; some sandbox providers instead
/// mount the workspace directly, in which case P1 collapses to a
/// verification that `.git` exists (fatal if not) instead of a clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceMode {
    Clone,
    LocalMount,
}

/// Git commit identity applied with `git config --local`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

/// How the supervisor obtains a repository-access token for git operations.
///
/// A pre-issued token always wins over minting one from App credentials —
/// this mirrors `_generate_github_token` in the original supervisor, which
/// checks `GITHUB_APP_TOKEN` before falling back to the App-credential path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Preissued(String),
    App {
        app_id: String,
        private_key: String,
        installation_id: String,
    },
}

/// Immutable supervisor configuration, parsed once from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorConfig {
    pub sandbox_id: String,
    pub session_id: String,
    pub control_plane_url: Option<Url>,
    pub sandbox_auth_token: String,
    pub repo_owner: Option<String>,
    pub repo_name: Option<String>,
    pub branch: String,
    pub provider: String,
    pub model: String,
    pub git_identity: Option<GitIdentity>,
    pub credentials: Option<Credentials>,
    pub agent_port: u16,
    pub setup_timeout_seconds: u64,
    /// Clone-vs-pre-mounted workspace acquisition, from `WORKSPACE_MODE`.
    pub workspace_mode: WorkspaceMode,
    /// Executable launched for the agent server. Overridable (`AGENT_BIN`)
    /// so integration tests can substitute a fake child; production
    /// sandboxes always run with the default.
    pub agent_bin: String,
    /// Executable launched for the control-plane bridge. Overridable
    /// (`BRIDGE_BIN`) for the same reason as `agent_bin`.
    pub bridge_bin: String,
}

impl SupervisorConfig {
    /// Parses configuration from the process environment. Optional values
    /// that are absent or empty degrade to `None`/empty rather than erroring
    /// — only a malformed `CONTROL_PLANE_URL` is treated as a config error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let non_empty = |key: &str| -> Option<String> {
            env::var(key).ok().filter(|v| !v.is_empty())
        };

        let control_plane_url = match non_empty("CONTROL_PLANE_URL") {
            Some(raw) => Some(Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
                field: "CONTROL_PLANE_URL",
                source: e.to_string(),
            })?),
            None => None,
        };

        let git_identity = match (non_empty("GIT_USER_NAME"), non_empty("GIT_USER_EMAIL")) {
            (Some(name), Some(email)) => Some(GitIdentity { name, email }),
            _ => None,
        };

        let credentials = non_empty("GITHUB_APP_TOKEN")
            .map(Credentials::Preissued)
            .or_else(|| {
                match (
                    non_empty("GITHUB_APP_ID"),
                    non_empty("GITHUB_APP_PRIVATE_KEY"),
                    non_empty("GITHUB_APP_INSTALLATION_ID"),
                ) {
                    (Some(app_id), Some(private_key), Some(installation_id)) => {
                        Some(Credentials::App {
                            app_id,
                            private_key,
                            installation_id,
                        })
                    }
                    _ => None,
                }
            });

        let agent_port = non_empty("AGENT_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_AGENT_PORT);

        let setup_timeout_seconds = non_empty("SETUP_TIMEOUT_SECONDS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SETUP_TIMEOUT_SECONDS);

        let workspace_mode = match non_empty("WORKSPACE_MODE").as_deref() {
            Some("local") | Some("mounted") => WorkspaceMode::LocalMount,
            _ => WorkspaceMode::Clone,
        };

        Ok(Self {
            sandbox_id: non_empty("SANDBOX_ID").unwrap_or_else(|| "unknown".to_string()),
            session_id: non_empty("SESSION_ID").unwrap_or_default(),
            control_plane_url,
            sandbox_auth_token: non_empty("SANDBOX_AUTH_TOKEN").unwrap_or_default(),
            repo_owner: non_empty("REPO_OWNER"),
            repo_name: non_empty("REPO_NAME"),
            branch: non_empty("BRANCH").unwrap_or_else(|| "main".to_string()),
            provider: non_empty("PROVIDER").unwrap_or_else(|| "anthropic".to_string()),
            model: non_empty("MODEL").unwrap_or_else(|| "claude-haiku-4-5".to_string()),
            git_identity,
            credentials,
            agent_port,
            setup_timeout_seconds,
            workspace_mode,
            agent_bin: non_empty("AGENT_BIN").unwrap_or_else(|| "agent".to_string()),
            bridge_bin: non_empty("BRIDGE_BIN").unwrap_or_else(|| "bridge".to_string()),
        })
    }
}
