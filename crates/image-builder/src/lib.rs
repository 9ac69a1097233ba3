//! Image Builder (C2): a one-shot async worker that provisions a build
//! sandbox, awaits its exit, snapshots the resulting filesystem, and reports
//! the outcome to a control plane over an authenticated, retried callback.

mod config;
mod error;
mod token_source;
mod worker;

pub use config::{BuilderConfig, ConfigError};
pub use error::BuildError;
pub use token_source::InternalTokenSource;
pub use worker::BuildWorker;
