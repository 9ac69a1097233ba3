//! Seam over the underlying sandbox-provider abstraction (create/wait/exec/
//! snapshot). The concrete backend that actually provisions isolated
//! execution environments is out of scope for this specification; the image
//! builder only ever talks to it through [`SandboxProvider`] and
//! [`BuildSandboxHandle`].

use async_trait::async_trait;
use std::collections::HashMap;

mod http_provider;
pub use http_provider::{HttpBuildSandboxHandle, HttpSandboxProvider};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to create build sandbox: {0}")]
    Create(String),
    #[error("failed to exec in sandbox: {0}")]
    Exec(String),
    #[error("failed to snapshot sandbox filesystem: {0}")]
    Snapshot(String),
}

/// Coordinates used to seed a one-shot build sandbox.
#[derive(Debug, Clone)]
pub struct BuildSandboxSpec {
    pub repo_owner: String,
    pub repo_name: String,
    pub default_branch: String,
    /// Repository-access token to embed for cloning; empty for public repos.
    pub clone_token: String,
    pub env_overrides: HashMap<String, String>,
}

/// Result of executing a command inside a sandbox via [`BuildSandboxHandle::exec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub exit_code: Option<i32>,
}

/// An opaque, provider-side filesystem snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxImage {
    pub object_id: String,
}

/// Handle to a running (or exited) build sandbox.
#[async_trait]
pub trait BuildSandboxHandle: Send + Sync {
    /// Blocks until the sandbox's main process exits.
    async fn wait(&mut self) -> Result<(), ProviderError>;

    /// The sandbox's exit code. Only meaningful after [`wait`](Self::wait).
    fn returncode(&self) -> Option<i32>;

    /// Runs a command inside the sandbox and captures its stdout.
    async fn exec(&self, argv: &[&str]) -> Result<ExecOutput, ProviderError>;

    /// Captures a filesystem snapshot of the sandbox, returning an opaque
    /// provider-side image identifier.
    async fn snapshot_filesystem(&self) -> Result<SandboxImage, ProviderError>;
}

/// Provisions isolated execution environments. The image builder's only
/// dependency on "how sandboxes actually work".
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    type Handle: BuildSandboxHandle;

    async fn create_build_sandbox(
        &self,
        spec: BuildSandboxSpec,
    ) -> Result<Self::Handle, ProviderError>;
}
