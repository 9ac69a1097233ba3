use jsonwebtoken::{Algorithm, EncodingKey, Header};

use crate::claims::Claims;
use crate::error::AuthError;

/// Signs [`Claims`] into a compact JWT. Kept as a trait, mirroring the
/// platform's JWT-signer seam, so alternative signing backends (e.g. a KMS)
/// can stand in without touching callers.
pub trait JwtSigner {
    fn sign(&self, claims: Claims) -> Result<String, AuthError>;
}

/// Signs with a key material held in process memory (a PEM-encoded RSA key
/// for GitHub App JWTs, or an HMAC secret for internal tokens).
pub struct LocalKeySigner {
    encoding_key: EncodingKey,
    algorithm: Algorithm,
}

impl LocalKeySigner {
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, AuthError> {
        let encoding_key = EncodingKey::from_rsa_pem(pem)
            .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
        Ok(Self {
            encoding_key,
            algorithm: Algorithm::RS256,
        })
    }

    pub fn from_hmac_secret(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }
}

impl JwtSigner for LocalKeySigner {
    fn sign(&self, claims: Claims) -> Result<String, AuthError> {
        let token = jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?;
        Ok(token)
    }
}
