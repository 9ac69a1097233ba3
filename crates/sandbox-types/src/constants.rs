use std::time::Duration;

/// Agent server port when `AGENT_PORT` is not set.
pub const DEFAULT_AGENT_PORT: u16 = 4096;

/// Deadline for the health probe when a control plane URL is configured.
pub const HEALTH_CHECK_TIMEOUT_REMOTE: Duration = Duration::from_secs(30);

/// Deadline for the health probe against a pre-mounted local workspace.
pub const HEALTH_CHECK_TIMEOUT_LOCAL: Duration = Duration::from_secs(60);

/// Poll interval used while waiting for the health endpoint to come up.
pub const HEALTH_CHECK_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Per-request timeout for a single health probe attempt.
pub const HEALTH_CHECK_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// A child may crash and be restarted this many times before the supervisor
/// gives up on it and shuts down. A 6th spawn attempt is never made.
pub const MAX_RESTARTS: u32 = 5;

pub const BACKOFF_BASE: f64 = 2.0;
pub const BACKOFF_MAX: Duration = Duration::from_secs(60);

/// Bridge graceful-terminate deadline before SIGKILL.
pub const BRIDGE_TERMINATE_TIMEOUT: Duration = Duration::from_secs(5);
/// Agent graceful-terminate deadline before SIGKILL.
pub const AGENT_TERMINATE_TIMEOUT: Duration = Duration::from_secs(10);
/// Fatal-error POST timeout; this path must never hang.
pub const FATAL_REPORT_TIMEOUT: Duration = Duration::from_secs(5);

pub const DEFAULT_SETUP_TIMEOUT_SECONDS: u64 = 300;
pub const SETUP_SCRIPT_RELATIVE_PATH: &str = ".openinspect/setup.sh";
pub const SETUP_OUTPUT_TAIL_LINES: usize = 50;

/// Per-attempt HTTP deadline for a callback delivery. The retry count and
/// backoff schedule themselves are owned by `sandbox_http::callback`, which
/// has no dependency on this crate — this timeout is the one callback-policy
/// number the image builder needs before it even has an `HttpClient`.
pub const CALLBACK_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Whole-build timeout is enforced by the external scheduler, not here.
pub const BUILD_SCHEDULER_TIMEOUT: Duration = Duration::from_secs(1800);

/// Monitoring loop tick rate; cancellation must be observed within one tick.
pub const MONITOR_TICK_INTERVAL: Duration = Duration::from_secs(1);
