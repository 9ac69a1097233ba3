use async_trait::async_trait;
use sandbox_http::{BearerTokenSource, HttpError};

/// Mints a fresh internal bearer token per callback attempt, signed with the
/// image builder's shared secret. Never caches a token across attempts — see
/// [`sandbox_http::BearerTokenSource`]'s contract.
pub struct InternalTokenSource {
    secret: Vec<u8>,
}

impl InternalTokenSource {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }
}

#[async_trait]
impl BearerTokenSource for InternalTokenSource {
    async fn token(&self) -> Result<String, HttpError> {
        sandbox_auth::generate_internal_token(&self.secret)
            .map_err(|e| HttpError::TokenMint(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mints_a_well_formed_bearer_token() {
        let source = InternalTokenSource::new(b"shared-secret".to_vec());
        let token = source.token().await.unwrap();
        assert_eq!(token.split('.').count(), 3);
    }
}
