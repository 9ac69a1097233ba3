use std::time::Duration;

use tokio::process::Child;
use tracing::{info, warn};

use crate::error::ProcessError;

/// Sends SIGTERM (Unix) to a running child's pid. On other platforms, falls
/// back to the child's own `start_kill`, since there is no portable
/// graceful-terminate signal.
#[cfg(unix)]
pub fn send_terminate(pid: u32) -> Result<(), ProcessError> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(|e| ProcessError::Signal {
        pid,
        source: std::io::Error::from_raw_os_error(e as i32),
    })
}

/// Terminates, then waits up to `deadline` for exit, then kills.
///
/// Every child the supervisor owns goes through this path on every exit
/// route (normal, cancelled, error) so none is ever left running when the
/// supervisor returns — the "no orphan children" invariant.
pub async fn terminate_then_kill(
    child: &mut Child,
    pid: u32,
    deadline: Duration,
) -> Result<(), ProcessError> {
    #[cfg(unix)]
    {
        if let Err(e) = send_terminate(pid) {
            warn!(pid, error = %e, "process.terminate_signal_failed");
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child.start_kill();
    }

    match tokio::time::timeout(deadline, child.wait()).await {
        Ok(Ok(status)) => {
            info!(pid, exit_status = %status, "process.terminated_gracefully");
            Ok(())
        }
        Ok(Err(e)) => Err(ProcessError::Wait(e)),
        Err(_elapsed) => {
            warn!(pid, deadline = ?deadline, "process.terminate_timeout_killing");
            child.start_kill().map_err(ProcessError::Wait)?;
            child.wait().await.map_err(ProcessError::Wait)?;
            Ok(())
        }
    }
}
