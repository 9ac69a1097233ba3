use tracing::info;

use crate::state::RuntimeState;

/// Spawns a task that awaits SIGTERM or SIGINT and, on either, requests
/// shutdown. Translates the OS signal into a channel send rather than
/// mutating shared state from an interrupt context, per the spec's
/// "signal handling must translate into a channel send" design note.
#[cfg(unix)]
pub fn spawn_signal_listener(state: RuntimeState) -> tokio::task::JoinHandle<()> {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "supervisor.sigterm_handler_error");
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "supervisor.sigint_handler_error");
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => info!(signal_name = "SIGTERM", "supervisor.signal"),
            _ = sigint.recv() => info!(signal_name = "SIGINT", "supervisor.signal"),
        }
        state.request_shutdown();
    })
}

#[cfg(not(unix))]
pub fn spawn_signal_listener(state: RuntimeState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(signal_name = "CTRL_C", "supervisor.signal");
            state.request_shutdown();
        }
    })
}
