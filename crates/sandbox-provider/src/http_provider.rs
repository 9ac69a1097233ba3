//! Concrete [`SandboxProvider`] backed by the control plane's own sandbox
//! API. This is the production wiring for the trait seam defined in
//! `lib.rs` — the underlying backend (what actually isolates and runs the
//! build sandbox) stays out of scope for this specification, but the image
//! builder binary still needs *something* concrete to construct at
//! startup, so this talks to it the same way the fatal-error reporter and
//! the callback client talk to the control plane: plain JSON over
//! `reqwest`, one endpoint per trait method.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{BuildSandboxHandle, BuildSandboxSpec, ExecOutput, ProviderError, SandboxImage, SandboxProvider};

/// Talks to `POST {base_url}/sandboxes(/...)` to create, wait on, exec in,
/// and snapshot build sandboxes.
#[derive(Debug, Clone)]
pub struct HttpSandboxProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSandboxProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Serialize)]
struct CreateSandboxRequest<'a> {
    repo_owner: &'a str,
    repo_name: &'a str,
    default_branch: &'a str,
    clone_token: &'a str,
    env_overrides: &'a std::collections::HashMap<String, String>,
}

#[derive(Deserialize)]
struct CreateSandboxResponse {
    sandbox_id: String,
}

#[derive(Deserialize)]
struct WaitResponse {
    exit_code: Option<i32>,
}

#[derive(Serialize)]
struct ExecRequest<'a> {
    argv: &'a [&'a str],
}

#[derive(Deserialize)]
struct ExecResponse {
    stdout: String,
    exit_code: Option<i32>,
}

#[derive(Deserialize)]
struct SnapshotResponse {
    object_id: String,
}

#[async_trait]
impl SandboxProvider for HttpSandboxProvider {
    type Handle = HttpBuildSandboxHandle;

    async fn create_build_sandbox(
        &self,
        spec: BuildSandboxSpec,
    ) -> Result<Self::Handle, ProviderError> {
        let url = format!("{}/sandboxes", self.base_url);
        let body = CreateSandboxRequest {
            repo_owner: &spec.repo_owner,
            repo_name: &spec.repo_name,
            default_branch: &spec.default_branch,
            clone_token: &spec.clone_token,
            env_overrides: &spec.env_overrides,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Create(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Create(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let parsed: CreateSandboxResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Create(e.to_string()))?;

        debug!(sandbox_id = %parsed.sandbox_id, "provider.sandbox_created");
        Ok(HttpBuildSandboxHandle {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            sandbox_id: parsed.sandbox_id,
            returncode: Mutex::new(None),
        })
    }
}

/// Handle to a sandbox created through [`HttpSandboxProvider`]. `returncode`
/// is populated once [`wait`](BuildSandboxHandle::wait) returns, matching
/// the trait's "only meaningful after `wait`" contract.
pub struct HttpBuildSandboxHandle {
    client: reqwest::Client,
    base_url: String,
    sandbox_id: String,
    returncode: Mutex<Option<i32>>,
}

#[async_trait]
impl BuildSandboxHandle for HttpBuildSandboxHandle {
    async fn wait(&mut self) -> Result<(), ProviderError> {
        let url = format!("{}/sandboxes/{}/wait", self.base_url, self.sandbox_id);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Create(e.to_string()))?;

        let parsed: WaitResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Create(e.to_string()))?;

        *self.returncode.lock().expect("returncode mutex poisoned") = parsed.exit_code;
        Ok(())
    }

    fn returncode(&self) -> Option<i32> {
        *self.returncode.lock().expect("returncode mutex poisoned")
    }

    async fn exec(&self, argv: &[&str]) -> Result<ExecOutput, ProviderError> {
        let url = format!("{}/sandboxes/{}/exec", self.base_url, self.sandbox_id);
        let response = self
            .client
            .post(&url)
            .json(&ExecRequest { argv })
            .send()
            .await
            .map_err(|e| ProviderError::Exec(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Exec(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let parsed: ExecResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Exec(e.to_string()))?;

        Ok(ExecOutput {
            stdout: parsed.stdout,
            exit_code: parsed.exit_code,
        })
    }

    async fn snapshot_filesystem(&self) -> Result<SandboxImage, ProviderError> {
        let url = format!("{}/sandboxes/{}/snapshot", self.base_url, self.sandbox_id);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Snapshot(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Snapshot(format!(
                "provider returned {}",
                response.status()
            )));
        }

        let parsed: SnapshotResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Snapshot(e.to_string()))?;

        Ok(SandboxImage {
            object_id: parsed.object_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    #[tokio::test]
    async fn create_wait_exec_snapshot_round_trip() {
        let server = MockServer::start();

        let create_mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/sandboxes");
            then.status(200)
                .json_body(serde_json::json!({ "sandbox_id": "sbx-42" }));
        });
        let wait_mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/sandboxes/sbx-42/wait");
            then.status(200).json_body(serde_json::json!({ "exit_code": 0 }));
        });
        let exec_mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/sandboxes/sbx-42/exec");
            then.status(200)
                .json_body(serde_json::json!({ "stdout": "abc123\n", "exit_code": 0 }));
        });
        let snapshot_mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/sandboxes/sbx-42/snapshot");
            then.status(200)
                .json_body(serde_json::json!({ "object_id": "img-xyz" }));
        });

        let provider = HttpSandboxProvider::new(server.base_url());
        let spec = BuildSandboxSpec {
            repo_owner: "acme".into(),
            repo_name: "widget".into(),
            default_branch: "main".into(),
            clone_token: String::new(),
            env_overrides: Default::default(),
        };

        let mut handle = provider.create_build_sandbox(spec).await.unwrap();
        handle.wait().await.unwrap();
        assert_eq!(handle.returncode(), Some(0));

        let exec_output = handle.exec(&["git", "rev-parse", "HEAD"]).await.unwrap();
        assert_eq!(exec_output.stdout, "abc123\n");

        let image = handle.snapshot_filesystem().await.unwrap();
        assert_eq!(image.object_id, "img-xyz");

        create_mock.assert_hits(1);
        wait_mock.assert_hits(1);
        exec_mock.assert_hits(1);
        snapshot_mock.assert_hits(1);
    }

    #[tokio::test]
    async fn non_success_status_on_create_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/sandboxes");
            then.status(500);
        });

        let provider = HttpSandboxProvider::new(server.base_url());
        let spec = BuildSandboxSpec {
            repo_owner: "acme".into(),
            repo_name: "widget".into(),
            default_branch: "main".into(),
            clone_token: String::new(),
            env_overrides: Default::default(),
        };

        let result = provider.create_build_sandbox(spec).await;
        assert!(matches!(result, Err(ProviderError::Create(_))));
    }
}
