//! Token minting for the sandbox supervisor and image builder.
//!
//! Two unrelated concerns share this crate because both boil down to
//! "sign a short-lived JWT and hand it to an HTTP caller": GitHub App
//! installation tokens (for git operations) and internal bearer tokens
//! (for authenticating callbacks to the control plane).

mod claims;
mod error;
mod github_app;
mod internal;
mod signer;

pub use claims::Claims;
pub use error::AuthError;
pub use github_app::generate_installation_token;
pub use internal::generate_internal_token;
pub use signer::{JwtSigner, LocalKeySigner};
