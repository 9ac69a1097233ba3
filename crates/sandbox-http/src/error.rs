#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error(
        "connection error: could not connect to the host. original error: {0}"
    )]
    Connect(#[source] reqwest::Error),
    #[error("timeout error: the request timed out. original error: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("unsuccessful response: {status} - body: {body}")]
    UnsuccessfulResponse { status: u16, body: String },
    #[error("generic transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("failed to mint bearer token: {0}")]
    TokenMint(String),
}

pub(crate) fn from_reqwest_error(e: reqwest::Error) -> HttpError {
    if e.is_connect() {
        HttpError::Connect(e)
    } else if e.is_timeout() {
        HttpError::Timeout(e)
    } else {
        HttpError::Transport(e)
    }
}
