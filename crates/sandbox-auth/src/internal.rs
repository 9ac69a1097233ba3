use chrono::Utc;

use crate::claims::Claims;
use crate::error::AuthError;
use crate::signer::{JwtSigner, LocalKeySigner};

/// Internal callback tokens are short-lived: long enough to survive one
/// retry round (worst case delays are 2s + 8s), far short enough that a
/// leaked token from a log line is stale within minutes.
const INTERNAL_TOKEN_LIFETIME_SECONDS: i64 = 5 * 60;

/// Mints a fresh bearer token for authenticating a callback POST to the
/// control plane, signed with a shared secret.
///
/// Called once per delivery attempt by the callback client — never cached —
/// so a retry never reuses a token the control plane may have already
/// consumed or that may have expired mid-backoff.
pub fn generate_internal_token(secret: &[u8]) -> Result<String, AuthError> {
    let signer = LocalKeySigner::from_hmac_secret(secret);
    let now = Utc::now().timestamp();
    let claims = Claims::new(now, now + INTERNAL_TOKEN_LIFETIME_SECONDS).with_subject("sandbox");
    signer.sign(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_a_well_formed_jwt() {
        let token = generate_internal_token(b"shared-secret").unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn two_calls_mint_different_tokens() {
        // jti is randomized per call, so retries never resend a byte-identical token.
        let a = generate_internal_token(b"shared-secret").unwrap();
        let b = generate_internal_token(b"shared-secret").unwrap();
        assert_ne!(a, b);
    }
}
