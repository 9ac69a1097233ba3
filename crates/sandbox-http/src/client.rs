use std::time::Duration;

use crate::error::{from_reqwest_error, HttpError};

/// Thin wrapper around a configured [`reqwest::Client`], mirroring the
/// platform's `http::client::HttpClient` shape: a single place that builds
/// the client with sane timeouts and classifies transport failures.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(from_reqwest_error)?;
        Ok(Self { client })
    }

    /// POSTs a JSON body and bearer token, treating any 2xx as success.
    pub async fn post_json_bearer(
        &self,
        url: &str,
        body: &serde_json::Value,
        bearer_token: &str,
    ) -> Result<(), HttpError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(bearer_token)
            .json(body)
            .send()
            .await
            .map_err(from_reqwest_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(HttpError::UnsuccessfulResponse { status, body })
        }
    }
}
