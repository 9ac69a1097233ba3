use tracing::info;

use crate::fatal::report_fatal;
use crate::supervisor::Supervisor;

impl Supervisor {
    /// Top-level entry point. Catches every fatal condition from startup,
    /// reports it, and always runs the shutdown epilogue on the way out —
    /// mirroring the original's `try/except/finally` shape without relying
    /// on unwinding: the `Result` is handled explicitly, then `shutdown()`
    /// runs unconditionally.
    pub async fn run(mut self) {
        info!(
            sandbox_id = %self.config.sandbox_id,
            session_id = %self.config.session_id,
            provider = %self.config.provider,
            model = %self.config.model,
            "supervisor.start"
        );

        if let Err(fatal) = self.run_startup().await {
            report_fatal(&self.config, &fatal.report_message()).await;
        } else {
            self.monitor().await;
        }

        self.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox_types::{Credentials, SupervisorConfig};

    #[tokio::test]
    async fn run_reaches_terminated_when_agent_fails_to_spawn() {
        let config = SupervisorConfig {
            sandbox_id: "sbx-1".into(),
            session_id: String::new(),
            control_plane_url: None,
            sandbox_auth_token: String::new(),
            repo_owner: None,
            repo_name: None,
            branch: "main".into(),
            provider: "anthropic".into(),
            model: "claude-haiku-4-5".into(),
            git_identity: None,
            credentials: Some(Credentials::Preissued("ghs".into())),
            agent_port: 0,
            setup_timeout_seconds: 1,
            workspace_mode: sandbox_types::WorkspaceMode::Clone,
            agent_bin: "/nonexistent/sandbox-agent-binary".into(),
            bridge_bin: "true".into(),
        };
        let workdir = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new(config, workdir.path().to_path_buf());
        let state = supervisor.state();

        tokio::time::timeout(std::time::Duration::from_secs(5), supervisor.run())
            .await
            .expect("a startup failure unwinds into shutdown promptly");

        assert_eq!(state.phase(), crate::state::Phase::Terminated);
    }
}
