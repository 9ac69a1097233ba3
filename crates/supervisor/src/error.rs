/// Raised by the startup routine on an unrecoverable condition (P4/P5
/// failure). Caught once at the top of `run()`, which reports it via the
/// fatal-error reporter and always runs the shutdown epilogue afterward —
/// this type never crosses the `run()` boundary itself.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorFatalError {
    #[error("pre-mounted workspace at {0} has no .git directory")]
    LocalMountMissing(String),
    #[error("agent failed to start: {0}")]
    AgentStartFailed(String),
    #[error("bridge failed to start: {0}")]
    BridgeStartFailed(String),
    #[error("agent crashed {restarts} times, giving up")]
    AgentRestartsExhausted { restarts: u32 },
    #[error("bridge crashed {restarts} times, giving up")]
    BridgeRestartsExhausted { restarts: u32 },
}

impl SupervisorFatalError {
    /// The message shape reported to the control plane, matching the
    /// original's plain-string `_report_fatal_error(message)` calls (e.g.
    /// `"Agent crashed N times, giving up"`).
    pub fn report_message(&self) -> String {
        match self {
            Self::LocalMountMissing(path) => {
                format!("Pre-mounted workspace at {path} has no .git directory")
            }
            Self::AgentStartFailed(reason) => format!("Agent failed to start: {reason}"),
            Self::BridgeStartFailed(reason) => format!("Bridge failed to start: {reason}"),
            Self::AgentRestartsExhausted { restarts } => {
                format!("Agent crashed {restarts} times, giving up")
            }
            Self::BridgeRestartsExhausted { restarts } => {
                format!("Bridge crashed {restarts} times, giving up")
            }
        }
    }
}
