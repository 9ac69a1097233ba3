use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

const SETUP_SCRIPT_RELATIVE_PATH: &str = ".openinspect/setup.sh";
const OUTPUT_TAIL_LINES: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// `.openinspect/setup.sh` was not present; nothing to run.
    NotPresent,
    Succeeded,
    Failed { output_tail: String },
    TimedOut { output_tail: String },
}

/// Runs `.openinspect/setup.sh` under `bash` with `cwd = repo_path`, bounded
/// by `timeout`. Always non-fatal to the supervisor: the result is data,
/// never an error the caller needs to propagate.
pub async fn run_setup_hook(repo_path: &Path, timeout: Duration) -> SetupOutcome {
    let script = repo_path.join(SETUP_SCRIPT_RELATIVE_PATH);
    if !script.exists() {
        debug!(path = %script.display(), "setup.skip reason=no_setup_script");
        return SetupOutcome::NotPresent;
    }

    info!(script = %script.display(), timeout_seconds = timeout.as_secs(), "setup.start");

    let mut child = match Command::new("bash")
        .arg(&script)
        .current_dir(repo_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            error!(error = %e, script = %script.display(), "setup.error");
            return SetupOutcome::Failed {
                output_tail: String::new(),
            };
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let stdout = child.stdout.take().expect("stdout piped");
    let stderr = child.stderr.take().expect("stderr piped");
    let out_task = spawn_line_reader(stdout, tx.clone());
    let err_task = spawn_line_reader(stderr, tx);

    let wait_result = tokio::time::timeout(timeout, child.wait()).await;

    let mut lines = Vec::new();
    rx.close();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    let _ = out_task.await;
    let _ = err_task.await;
    // Drain anything the readers produced after the first drain pass.
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    let output_tail = tail(&lines, OUTPUT_TAIL_LINES);

    match wait_result {
        Err(_elapsed) => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            error!(
                timeout_seconds = timeout.as_secs(),
                script = %script.display(),
                "setup.timeout"
            );
            SetupOutcome::TimedOut { output_tail }
        }
        Ok(Ok(status)) if status.success() => {
            debug!(exit_code = 0, "setup.complete");
            SetupOutcome::Succeeded
        }
        Ok(Ok(status)) => {
            error!(exit_code = status.code(), script = %script.display(), "setup.failed");
            SetupOutcome::Failed { output_tail }
        }
        Ok(Err(e)) => {
            error!(error = %e, script = %script.display(), "setup.error");
            SetupOutcome::Failed { output_tail }
        }
    }
}

fn spawn_line_reader<R>(reader: R, tx: mpsc::UnboundedSender<String>) -> tokio::task::JoinHandle<()>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    })
}

fn tail(lines: &[String], n: usize) -> String {
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
