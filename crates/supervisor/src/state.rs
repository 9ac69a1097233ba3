use tokio::sync::watch;

/// Startup/runtime phase, driven strictly forward by the startup routine and
/// exposed over a watch channel so tests can assert ordering (e.g. "bridge
/// never starts before `AgentReady`") without scraping log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    WorkspaceReady,
    AgentReady,
    BridgeReady,
    Monitoring,
    ShuttingDown,
    Terminated,
}

/// One-shot latches plus the phase channel, shared between the startup
/// routine, the monitoring loop, the signal listener, and the health prober.
///
/// Everything here is a `watch` channel rather than a plain `bool` behind a
/// mutex: readers can both poll the current value and `.changed()`-await the
/// next transition, which is what lets the health prober and monitor loop
/// observe `shutdown_requested` within one poll interval instead of racing a
/// lock.
#[derive(Clone)]
pub struct RuntimeState {
    phase_tx: watch::Sender<Phase>,
    phase_rx: watch::Receiver<Phase>,
    agent_ready_tx: watch::Sender<bool>,
    agent_ready_rx: watch::Receiver<bool>,
    workspace_ready_tx: watch::Sender<bool>,
    workspace_ready_rx: watch::Receiver<bool>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RuntimeState {
    pub fn new() -> Self {
        let (phase_tx, phase_rx) = watch::channel(Phase::Init);
        let (agent_ready_tx, agent_ready_rx) = watch::channel(false);
        let (workspace_ready_tx, workspace_ready_rx) = watch::channel(false);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            phase_tx,
            phase_rx,
            agent_ready_tx,
            agent_ready_rx,
            workspace_ready_tx,
            workspace_ready_rx,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase_rx.borrow()
    }

    pub fn set_phase(&self, phase: Phase) {
        let _ = self.phase_tx.send(phase);
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.phase_rx.clone()
    }

    pub fn latch_workspace_ready(&self) {
        let _ = self.workspace_ready_tx.send(true);
    }

    pub fn workspace_ready(&self) -> bool {
        *self.workspace_ready_rx.borrow()
    }

    pub fn clear_agent_ready(&self) {
        let _ = self.agent_ready_tx.send(false);
    }

    pub fn latch_agent_ready(&self) {
        let _ = self.agent_ready_tx.send(true);
    }

    pub fn agent_ready(&self) -> bool {
        *self.agent_ready_rx.borrow()
    }

    /// Resolves once `agent_ready` is set, returning immediately if it
    /// already is. Used by the bridge-start phase, which must never spawn
    /// before the agent's health probe has succeeded.
    pub async fn wait_agent_ready(&self) {
        let mut rx = self.agent_ready_rx.clone();
        if *rx.borrow() {
            return;
        }
        let _ = rx.wait_for(|ready| *ready).await;
    }

    pub fn request_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn shutdown_requested(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    pub fn subscribe_shutdown(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self::new()
    }
}
