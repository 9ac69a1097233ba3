use sandbox_http::HttpClient;
use sandbox_types::{SupervisorConfig, FATAL_REPORT_TIMEOUT};
use tracing::error;

/// Best-effort POST of `{error, fatal: true}` to the control plane. Single
/// attempt, 5-second timeout — this path must never itself hang, since it
/// runs on the way into shutdown.
pub async fn report_fatal(config: &SupervisorConfig, message: &str) {
    error!(message, "supervisor.fatal");

    let Some(base_url) = &config.control_plane_url else {
        return;
    };

    let url = format!(
        "{}/sandbox/{}/error",
        base_url.as_str().trim_end_matches('/'),
        config.sandbox_id
    );
    let payload = serde_json::json!({ "error": message, "fatal": true });

    let Ok(http) = HttpClient::new(FATAL_REPORT_TIMEOUT) else {
        return;
    };

    if let Err(e) = http
        .post_json_bearer(&url, &payload, &config.sandbox_auth_token)
        .await
    {
        error!(error = %e, "supervisor.report_error_failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use sandbox_types::Credentials;
    use url::Url;

    fn config_with_control_plane(url: &str) -> SupervisorConfig {
        SupervisorConfig {
            sandbox_id: "sbx-1".into(),
            session_id: String::new(),
            control_plane_url: Some(Url::parse(url).unwrap()),
            sandbox_auth_token: "tok".into(),
            repo_owner: None,
            repo_name: None,
            branch: "main".into(),
            provider: "anthropic".into(),
            model: "claude-haiku-4-5".into(),
            git_identity: None,
            credentials: Some(Credentials::Preissued("ghs".into())),
            agent_port: 4096,
            setup_timeout_seconds: 300,
            workspace_mode: sandbox_types::WorkspaceMode::Clone,
            agent_bin: "agent".into(),
            bridge_bin: "bridge".into(),
        }
    }

    #[tokio::test]
    async fn posts_fatal_error_to_the_sandbox_endpoint() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/sandbox/sbx-1/error")
                .header("authorization", "Bearer tok")
                .json_body(serde_json::json!({
                    "error": "Agent crashed 6 times, giving up",
                    "fatal": true
                }));
            then.status(200);
        });

        let config = config_with_control_plane(&server.base_url());
        report_fatal(&config, "Agent crashed 6 times, giving up").await;

        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn does_nothing_when_no_control_plane_is_configured() {
        let config = SupervisorConfig {
            sandbox_id: "sbx-1".into(),
            session_id: String::new(),
            control_plane_url: None,
            sandbox_auth_token: String::new(),
            repo_owner: None,
            repo_name: None,
            branch: "main".into(),
            provider: "anthropic".into(),
            model: "claude-haiku-4-5".into(),
            git_identity: None,
            credentials: None,
            agent_port: 4096,
            setup_timeout_seconds: 300,
            workspace_mode: sandbox_types::WorkspaceMode::Clone,
            agent_bin: "agent".into(),
            bridge_bin: "bridge".into(),
        };
        // Should return promptly without panicking.
        report_fatal(&config, "unreachable").await;
    }
}
