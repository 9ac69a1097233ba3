use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::client::HttpClient;
use crate::error::HttpError;

/// At most this many HTTP requests are made per logical callback.
pub const CALLBACK_MAX_RETRIES: u32 = 3;

/// Delay applied after the failure of attempt `k` (1-indexed), before
/// attempt `k+1`. Only the first `CALLBACK_MAX_RETRIES - 1` entries are ever
/// used, since the final attempt's failure is not followed by a sleep.
const CALLBACK_RETRY_DELAYS_SECONDS: [u64; 3] = [2, 8, 32];

/// Mints a fresh bearer token for one callback attempt. Implementations must
/// never cache — a retry that reused a stale token would defeat the point
/// of per-attempt minting (a control plane that rotates or single-uses
/// tokens would reject it).
#[async_trait]
pub trait BearerTokenSource: Send + Sync {
    async fn token(&self) -> Result<String, HttpError>;
}

/// Delivers a JSON body to a URL with bounded retries and exponential
/// backoff. Never raises to the caller: the outcome is a boolean.
pub struct CallbackClient<T: BearerTokenSource> {
    http: HttpClient,
    token_source: T,
}

impl<T: BearerTokenSource> CallbackClient<T> {
    pub fn new(http: HttpClient, token_source: T) -> Self {
        Self { http, token_source }
    }

    /// Delivers `payload` to `url`, retrying on any transport error,
    /// timeout, or non-2xx response. Returns `true` iff a 2xx was observed.
    pub async fn deliver(&self, url: &str, payload: &serde_json::Value) -> bool {
        for attempt in 1..=CALLBACK_MAX_RETRIES {
            match self.try_once(url, payload).await {
                Ok(()) => {
                    info!(url, attempt, "callback.success");
                    return true;
                }
                Err(e) => {
                    if attempt < CALLBACK_MAX_RETRIES {
                        let delay = CALLBACK_RETRY_DELAYS_SECONDS[(attempt - 1) as usize];
                        warn!(
                            url,
                            attempt,
                            max_retries = CALLBACK_MAX_RETRIES,
                            delay_s = delay,
                            error = %e,
                            "callback.retry"
                        );
                        tokio::time::sleep(Duration::from_secs(delay)).await;
                    } else {
                        error!(url, attempt, error = %e, "callback.failed");
                    }
                }
            }
        }
        false
    }

    async fn try_once(&self, url: &str, payload: &serde_json::Value) -> Result<(), HttpError> {
        let token = self.token_source.token().await?;
        self.http.post_json_bearer(url, payload, &token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedToken;

    #[async_trait]
    impl BearerTokenSource for FixedToken {
        async fn token(&self) -> Result<String, HttpError> {
            Ok("fixed-token".to_string())
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_2xx() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/cb");
            then.status(200);
        });

        let http = HttpClient::new(Duration::from_secs(5)).unwrap();
        let client = CallbackClient::new(http, FixedToken);
        let ok = client
            .deliver(&server.url("/cb"), &serde_json::json!({"a": 1}))
            .await;

        assert!(ok);
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn retries_up_to_three_times_then_gives_up() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/cb");
            then.status(503);
        });

        let http = HttpClient::new(Duration::from_secs(5)).unwrap();
        let client = CallbackClient::new(http, FixedToken);

        tokio::time::pause();
        let ok = client
            .deliver(&server.url("/cb"), &serde_json::json!({"a": 1}))
            .await;

        assert!(!ok);
        mock.assert_hits(3);
    }

    #[tokio::test]
    async fn delivers_on_third_attempt_with_expected_backoff() {
        let server = MockServer::start();
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let mock = server.mock(move |when, then| {
            when.method(httpmock::Method::POST).path("/cb");
            let n = attempts_clone.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                then.status(503);
            } else {
                then.status(200);
            }
        });

        let http = HttpClient::new(Duration::from_secs(5)).unwrap();
        let client = CallbackClient::new(http, FixedToken);

        tokio::time::pause();
        let ok = client
            .deliver(&server.url("/cb"), &serde_json::json!({"a": 1}))
            .await;

        assert!(ok);
        mock.assert_hits(3);
    }
}
