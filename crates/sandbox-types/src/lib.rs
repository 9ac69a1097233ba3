//! Shared data model for the sandbox supervisor (C1) and the image builder (C2).
//!
//! Nothing in this crate talks to the network or the filesystem; it only
//! defines the shapes both binaries agree on and the environment parsing
//! that turns `std::env` into an immutable config struct once, at startup.

mod build;
mod config;
mod constants;

pub use build::{BuildOutcome, BuildRequest};
pub use config::{ConfigError, Credentials, GitIdentity, SupervisorConfig, WorkspaceMode};
pub use constants::*;
