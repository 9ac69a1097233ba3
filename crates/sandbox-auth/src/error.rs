#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("could not encode jwt: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[error("github api request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("github api returned {status}: {body}")]
    UnsuccessfulResponse { status: u16, body: String },
    #[error("missing app credentials")]
    MissingCredentials,
}
