use std::time::Instant;

use sandbox_http::{CallbackClient, HttpClient, HttpError};
use sandbox_provider::{BuildSandboxHandle, BuildSandboxSpec, SandboxProvider};
use sandbox_types::{BuildOutcome, BuildRequest, Credentials, CALLBACK_REQUEST_TIMEOUT};
use tracing::{error, info, warn};

use crate::config::BuilderConfig;
use crate::error::BuildError;
use crate::token_source::InternalTokenSource;

/// Runs one build end to end: create sandbox, await exit, snapshot, deliver
/// exactly one callback (success or failure). Holds no state across builds —
/// a fresh `BuildWorker` (or a shared, `Clone`-free reference) handles every
/// invocation independently, matching spec.md §5's "no shared state with
/// other builders".
pub struct BuildWorker<P: SandboxProvider> {
    provider: P,
    callback: CallbackClient<InternalTokenSource>,
    credentials: Option<Credentials>,
    github_http: reqwest::Client,
}

impl<P: SandboxProvider> BuildWorker<P> {
    pub fn new(provider: P, config: &BuilderConfig) -> Result<Self, HttpError> {
        let http = HttpClient::new(CALLBACK_REQUEST_TIMEOUT)?;
        let callback = CallbackClient::new(http, InternalTokenSource::new(config.internal_secret.clone()));
        Ok(Self {
            provider,
            callback,
            credentials: config.credentials.clone(),
            github_http: reqwest::Client::new(),
        })
    }

    /// Builds `request`'s repository image and reports the outcome. Never
    /// returns an error to the caller — every failure in steps 1-6 is
    /// caught, logged, and turned into a failure callback instead, matching
    /// the Python original's single top-level `try/except`.
    pub async fn build(&self, request: BuildRequest) {
        let start = Instant::now();
        info!(
            build_id = %request.build_id,
            repo_owner = %request.repo_owner,
            repo_name = %request.repo_name,
            default_branch = %request.default_branch,
            "build.start"
        );

        match self.run_build(&request).await {
            Ok((provider_image_id, base_sha)) => {
                let duration = start.elapsed().as_secs_f64();
                info!(
                    build_id = %request.build_id,
                    provider_image_id = %provider_image_id,
                    base_sha = %base_sha,
                    build_duration_s = format!("{duration:.1}"),
                    "build.success"
                );

                if !request.callback_url.is_empty() {
                    let outcome =
                        BuildOutcome::success(request.build_id.clone(), provider_image_id, base_sha, duration);
                    self.callback.deliver(&request.callback_url, &outcome.to_payload()).await;
                }
            }
            Err(e) => {
                let duration = start.elapsed().as_secs_f64();
                error!(
                    build_id = %request.build_id,
                    error = %e,
                    build_duration_s = format!("{duration:.1}"),
                    "build.failed"
                );

                if !request.callback_url.is_empty() {
                    let outcome = BuildOutcome::failure(request.build_id.clone(), e.to_string());
                    let url = request.failure_callback_url();
                    self.callback.deliver(&url, &outcome.to_payload()).await;
                }
            }
        }
    }

    async fn run_build(&self, request: &BuildRequest) -> Result<(String, String), BuildError> {
        let clone_token = self.github_token().await.unwrap_or_default();

        let spec = BuildSandboxSpec {
            repo_owner: request.repo_owner.clone(),
            repo_name: request.repo_name.clone(),
            default_branch: request.default_branch.clone(),
            clone_token,
            env_overrides: request.env_overrides.clone().unwrap_or_default(),
        };

        let mut handle = self.provider.create_build_sandbox(spec).await?;
        handle.wait().await?;

        let exit_code = handle.returncode();
        if exit_code != Some(0) {
            return Err(BuildError::NonZeroExit(exit_code));
        }

        let base_sha = read_head_sha(&handle).await;
        let image = handle.snapshot_filesystem().await?;

        Ok((image.object_id, base_sha))
    }

    /// Mints a clone token if App credentials are configured; absent or
    /// failed minting degrades to an empty token (public repos still clone).
    async fn github_token(&self) -> Option<String> {
        match &self.credentials {
            Some(Credentials::Preissued(token)) => Some(token.clone()),
            Some(Credentials::App {
                app_id,
                private_key,
                installation_id,
            }) => sandbox_auth::generate_installation_token(&self.github_http, app_id, private_key, installation_id)
                .await
                .inspect_err(|e| warn!(error = %e, "github.token_error"))
                .ok(),
            None => None,
        }
    }
}

/// Reads the build sandbox's HEAD SHA for observability. Never fatal to the
/// build — a failed read degrades to an empty string.
async fn read_head_sha<H: BuildSandboxHandle>(handle: &H) -> String {
    match handle
        .exec(&["git", "-C", "/workspace/repo", "rev-parse", "HEAD"])
        .await
    {
        Ok(output) => output.stdout.trim().to_string(),
        Err(e) => {
            warn!(error = %e, "sandbox.read_sha_error");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use mockall::mock;
    use sandbox_provider::{ExecOutput, ProviderError, SandboxImage};

    mock! {
        pub SandboxProviderMockall {}

        #[async_trait::async_trait]
        impl SandboxProvider for SandboxProviderMockall {
            type Handle = MockBuildSandboxHandleMockall;

            async fn create_build_sandbox(
                &self,
                spec: BuildSandboxSpec,
            ) -> Result<MockBuildSandboxHandleMockall, ProviderError>;
        }
    }

    mock! {
        pub BuildSandboxHandleMockall {}

        #[async_trait::async_trait]
        impl BuildSandboxHandle for BuildSandboxHandleMockall {
            async fn wait(&mut self) -> Result<(), ProviderError>;
            fn returncode(&self) -> Option<i32>;
            async fn exec(&self, argv: &[&str]) -> Result<ExecOutput, ProviderError>;
            async fn snapshot_filesystem(&self) -> Result<SandboxImage, ProviderError>;
        }
    }

    fn test_config() -> BuilderConfig {
        BuilderConfig {
            internal_secret: b"shared-secret".to_vec(),
            credentials: None,
            provider_url: "https://provider.example".into(),
        }
    }

    fn test_request(callback_url: String) -> BuildRequest {
        BuildRequest {
            build_id: "b-1".into(),
            repo_owner: "acme".into(),
            repo_name: "widget".into(),
            default_branch: "main".into(),
            callback_url,
            env_overrides: None,
        }
    }

    fn healthy_handle() -> MockBuildSandboxHandleMockall {
        let mut handle = MockBuildSandboxHandleMockall::new();
        handle.expect_wait().returning(|| Ok(()));
        handle.expect_returncode().returning(|| Some(0));
        handle
            .expect_exec()
            .returning(|_argv| Ok(ExecOutput { stdout: "abc123\n".into(), exit_code: Some(0) }));
        handle.expect_snapshot_filesystem().returning(|| {
            Ok(SandboxImage { object_id: "img-xyz".into() })
        });
        handle
    }

    #[tokio::test]
    async fn successful_build_delivers_the_success_payload() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/builds/b-1/build-complete");
            then.status(200);
        });

        let mut provider = MockSandboxProviderMockall::new();
        provider
            .expect_create_build_sandbox()
            .returning(|_spec| Ok(healthy_handle()));

        let worker = BuildWorker::new(provider, &test_config()).unwrap();
        worker.build(test_request(server.url("/builds/b-1/build-complete"))).await;

        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn nonzero_exit_delivers_to_the_build_failed_suffix() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/builds/b-1/build-failed");
            then.status(200);
        });

        let mut provider = MockSandboxProviderMockall::new();
        provider.expect_create_build_sandbox().returning(|_spec| {
            let mut handle = MockBuildSandboxHandleMockall::new();
            handle.expect_wait().returning(|| Ok(()));
            handle.expect_returncode().returning(|| Some(7));
            Ok(handle)
        });

        let worker = BuildWorker::new(provider, &test_config()).unwrap();
        worker.build(test_request(server.url("/builds/b-1/build-complete"))).await;

        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn no_callback_is_attempted_when_callback_url_is_empty() {
        let mut provider = MockSandboxProviderMockall::new();
        provider
            .expect_create_build_sandbox()
            .returning(|_spec| Ok(healthy_handle()));

        let worker = BuildWorker::new(provider, &test_config()).unwrap();
        // Should return promptly without panicking on an empty URL.
        worker.build(test_request(String::new())).await;
    }

    #[tokio::test]
    async fn sha_read_failure_degrades_to_an_empty_string() {
        let mut handle = MockBuildSandboxHandleMockall::new();
        handle
            .expect_exec()
            .returning(|_argv| Err(ProviderError::Exec("no such file".into())));

        let sha = read_head_sha(&handle).await;
        assert_eq!(sha, "");
    }
}
