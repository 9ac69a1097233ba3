use sandbox_types::{AGENT_TERMINATE_TIMEOUT, BRIDGE_TERMINATE_TIMEOUT};
use tracing::{info, warn};

use crate::state::Phase;
use crate::supervisor::Supervisor;

impl Supervisor {
    /// Terminates bridge then agent, in that order, each with its own
    /// graceful deadline before a kill. Idempotent against children that
    /// already exited; always leaves both reaped before returning — the
    /// "no orphan children" invariant.
    pub async fn shutdown(&mut self) {
        self.state.set_phase(Phase::ShuttingDown);
        info!("supervisor.shutdown_start");

        if let Some(mut bridge) = self.bridge.take() {
            if bridge.try_exit_status().ok().flatten().is_none() {
                if let Err(e) = bridge.terminate_then_kill(BRIDGE_TERMINATE_TIMEOUT).await {
                    warn!(error = %e, "supervisor.bridge_terminate_error");
                }
            }
        }

        if let Some(mut agent) = self.agent.take() {
            if agent.try_exit_status().ok().flatten().is_none() {
                if let Err(e) = agent.terminate_then_kill(AGENT_TERMINATE_TIMEOUT).await {
                    warn!(error = %e, "supervisor.agent_terminate_error");
                }
            }
        }

        self.state.set_phase(Phase::Terminated);
        info!("supervisor.shutdown_complete");
    }
}
