//! A small `reqwest` wrapper plus the retrying, authenticated callback
//! client used by both the supervisor (fatal-error reporting) and the image
//! builder (build-outcome delivery).

mod callback;
mod client;
mod error;

pub use callback::{BearerTokenSource, CallbackClient, CALLBACK_MAX_RETRIES};
pub use client::HttpClient;
pub use error::HttpError;
