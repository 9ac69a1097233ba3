//! Polls an agent server's health endpoint until it answers, a deadline
//! passes, or the supervisor asks us to stop.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HealthError {
    #[error("health check deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
    #[error("shutdown requested during health check")]
    ShutdownRequested,
}

/// Polls `url` every 500ms (2s per-request timeout) until a single 2xx
/// response is observed, `deadline` elapses, or `shutdown` is signaled.
///
/// The shutdown channel is checked every poll, so cancellation is observed
/// within one poll interval — never after a stuck in-flight request, since
/// each request carries its own short timeout.
pub async fn wait_until_healthy(
    client: &reqwest::Client,
    url: &str,
    deadline: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), HealthError> {
    let start = Instant::now();

    loop {
        if *shutdown.borrow() {
            return Err(HealthError::ShutdownRequested);
        }

        if start.elapsed() >= deadline {
            return Err(HealthError::DeadlineExceeded(deadline));
        }

        match tokio::time::timeout(REQUEST_TIMEOUT, client.get(url).send()).await {
            Ok(Ok(response)) if response.status().is_success() => return Ok(()),
            Ok(Ok(response)) => {
                debug!(url, status = %response.status(), "health_check.non_success");
            }
            Ok(Err(e)) => {
                debug!(url, error = %e, "health_check.request_error");
            }
            Err(_elapsed) => {
                debug!(url, "health_check.request_timeout");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return Err(HealthError::ShutdownRequested);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    #[tokio::test]
    async fn succeeds_once_endpoint_answers_2xx() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/health");
            then.status(200);
        });

        let client = reqwest::Client::new();
        let (_tx, rx) = watch::channel(false);
        let result = wait_until_healthy(
            &client,
            &server.url("/health"),
            Duration::from_secs(5),
            rx,
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn fails_with_deadline_exceeded_when_endpoint_never_answers() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/health");
            then.status(503);
        });

        let client = reqwest::Client::new();
        let (_tx, rx) = watch::channel(false);
        let result = wait_until_healthy(
            &client,
            &server.url("/health"),
            Duration::from_millis(200),
            rx,
        )
        .await;

        assert_eq!(result, Err(HealthError::DeadlineExceeded(Duration::from_millis(200))));
    }

    #[tokio::test]
    async fn stops_immediately_when_shutdown_already_requested() {
        let client = reqwest::Client::new();
        let (_tx, rx) = watch::channel(true);
        let result = wait_until_healthy(
            &client,
            "http://localhost:1/health",
            Duration::from_secs(30),
            rx,
        )
        .await;

        assert_eq!(result, Err(HealthError::ShutdownRequested));
    }

    #[tokio::test]
    async fn observes_shutdown_signaled_mid_poll() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/health");
            then.status(503);
        });

        let client = reqwest::Client::new();
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            wait_until_healthy(&client, &server.url("/health"), Duration::from_secs(30), rx).await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("observed shutdown within one poll interval")
            .unwrap();

        assert_eq!(result, Err(HealthError::ShutdownRequested));
    }
}
