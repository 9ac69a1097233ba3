//! The in-sandbox Supervisor (PID 1): bootstraps a workspace, launches an
//! agent server and a control-plane bridge, monitors and restarts them with
//! bounded backoff, and shuts down cooperatively on signal or exhaustion.

mod children;
mod error;
mod fatal;
mod monitor;
mod run;
mod shutdown;
mod signals;
mod startup;
mod state;
mod supervisor;

pub use error::SupervisorFatalError;
pub use signals::spawn_signal_listener;
pub use state::{Phase, RuntimeState};
pub use supervisor::Supervisor;
