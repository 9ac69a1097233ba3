use std::time::Duration;

use sandbox_health::wait_until_healthy;
use sandbox_process::spawn;
use sandbox_types::{WorkspaceMode, HEALTH_CHECK_TIMEOUT_LOCAL, HEALTH_CHECK_TIMEOUT_REMOTE};
use sandbox_workspace::{configure_identity, install_plugin_assets, run_setup_hook, sync, verify_local_mount};
use tracing::{info, warn};

use crate::children::{agent_spawn_spec, bridge_spawn_spec};
use crate::error::SupervisorFatalError;
use crate::state::Phase;
use crate::supervisor::Supervisor;

/// Path the agent's custom tool script is staged from, when present. Absent
/// in most deployments (the agent image bundles its own tools); staging is
/// skipped entirely when this path doesn't exist.
const PLUGIN_SOURCE_PATH: &str = "/opt/sandbox/src/sandbox/inspect-plugin.js";

impl Supervisor {
    /// Runs phases P1 through P5 strictly in order. Returns `Ok(())` once
    /// the supervisor has reached `Monitoring`; an `Err` here is a fatal
    /// condition the caller must report and then unwind into shutdown.
    pub async fn run_startup(&mut self) -> Result<(), SupervisorFatalError> {
        self.phase_workspace_sync().await?;
        self.phase_git_identity().await;
        self.phase_setup().await;
        self.phase_agent_start().await?;
        self.phase_bridge_start().await?;

        self.state.set_phase(Phase::Monitoring);
        Ok(())
    }

    /// P1: either clone/fetch/rebase, or (local-mount variant) verify the
    /// pre-mounted workspace already has a `.git` directory. The clone path
    /// always latches `workspace_ready` regardless of outcome — a failed
    /// sync is logged for operator triage but never blocks the rest of
    /// startup. The local-mount path is the one case where P1 is fatal: a
    /// sandbox provider that promised a mounted repo and didn't deliver one
    /// is not a situation supervision can recover from.
    async fn phase_workspace_sync(&mut self) -> Result<(), SupervisorFatalError> {
        if self.config.workspace_mode == WorkspaceMode::LocalMount {
            if !verify_local_mount(&self.workdir) {
                return Err(SupervisorFatalError::LocalMountMissing(
                    self.workdir.display().to_string(),
                ));
            }
            self.state.latch_workspace_ready();
            self.state.set_phase(Phase::WorkspaceReady);
            return Ok(());
        }

        let token = self.github_token().await;
        let outcome = sync(
            &self.workdir,
            self.config.repo_owner.as_deref(),
            self.config.repo_name.as_deref(),
            &self.config.branch,
            token.as_deref(),
        )
        .await;
        info!(outcome = ?outcome, "supervisor.workspace_sync_complete");

        self.state.latch_workspace_ready();
        self.state.set_phase(Phase::WorkspaceReady);
        Ok(())
    }

    /// P2: configure commit identity. Skipped if unset; never fatal.
    async fn phase_git_identity(&mut self) {
        if let Some(identity) = &self.config.git_identity {
            configure_identity(&self.workdir, &identity.name, &identity.email).await;
        }
    }

    /// P3: the repo's own `.openinspect/setup.sh`. Never fatal — failure
    /// and timeout are both logged by `run_setup_hook` itself.
    async fn phase_setup(&mut self) {
        let timeout = Duration::from_secs(self.config.setup_timeout_seconds);
        run_setup_hook(&self.workdir, timeout).await;
    }

    /// P4: stage plugin assets, spawn the agent, and block until its health
    /// endpoint answers. Failure here is fatal: the sandbox has no agent to
    /// serve the session.
    pub(crate) async fn phase_agent_start(&mut self) -> Result<(), SupervisorFatalError> {
        install_plugin_assets(&self.workdir, std::path::Path::new(PLUGIN_SOURCE_PATH)).await;

        let spec = agent_spawn_spec(&self.config, &self.workdir);
        let child = spawn(spec).map_err(|e| SupervisorFatalError::AgentStartFailed(e.to_string()))?;
        self.agent = Some(child);

        let health_timeout = match self.config.workspace_mode {
            WorkspaceMode::LocalMount => HEALTH_CHECK_TIMEOUT_LOCAL,
            WorkspaceMode::Clone => HEALTH_CHECK_TIMEOUT_REMOTE,
        };
        let health_url = format!("http://localhost:{}/global/health", self.config.agent_port);
        wait_until_healthy(
            &self.http,
            &health_url,
            health_timeout,
            self.state.subscribe_shutdown(),
        )
        .await
        .map_err(|e| SupervisorFatalError::AgentStartFailed(e.to_string()))?;

        self.state.latch_agent_ready();
        self.state.set_phase(Phase::AgentReady);
        info!("agent.ready");
        Ok(())
    }

    /// P5: spawn the bridge once the agent is confirmed ready. A bridge that
    /// exits zero within the first 500ms is treated the same as a graceful
    /// exit observed later during monitoring (session already done). A
    /// bridge that crashes (non-zero) in that same window is *not*
    /// escalated to a startup failure: it is logged and handed to
    /// `monitor()` exactly like any crash observed on a later tick, so it
    /// goes through the same `RestartPolicy`/`MAX_RESTARTS` backoff as every
    /// other child crash rather than tearing down the supervisor on the
    /// first failed spawn.
    pub(crate) async fn phase_bridge_start(&mut self) -> Result<(), SupervisorFatalError> {
        let Some(control_plane_url) = self.config.control_plane_url.clone() else {
            info!("bridge.skip reason=no_control_plane_url");
            return Ok(());
        };
        if self.config.session_id.is_empty() {
            info!("bridge.skip reason=no_session_id");
            return Ok(());
        }

        self.state.wait_agent_ready().await;

        let spec = bridge_spawn_spec(&self.config, control_plane_url.as_str());
        let mut child =
            spawn(spec).map_err(|e| SupervisorFatalError::BridgeStartFailed(e.to_string()))?;
        info!("bridge.started");

        tokio::time::sleep(Duration::from_millis(500)).await;
        if let Ok(Some(status)) = child.try_exit_status() {
            if status.success() {
                warn!(exit_code = ?status.code(), "bridge.early_exit");
                self.state.request_shutdown();
            } else {
                warn!(exit_code = ?status.code(), "bridge.startup_crash");
            }
        }

        self.bridge = Some(child);
        self.state.set_phase(Phase::BridgeReady);
        Ok(())
    }

}
