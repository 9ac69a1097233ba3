use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims, built with the same `with_*` consuming-builder shape the
/// platform's shared JWT-signing crate uses for every signed token it mints.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID, always present so replays are distinguishable in logs.
    jti: String,
    /// Issued at (seconds since epoch).
    iat: i64,
    /// Expiration (seconds since epoch). Required.
    pub(crate) exp: i64,
    /// Issuer. Empty unless set.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    iss: String,
    /// Subject. Empty unless set.
    #[serde(skip_serializing_if = "String::is_empty", default)]
    sub: String,
}

impl Claims {
    pub fn new(iat: i64, exp: i64) -> Self {
        Self {
            jti: Uuid::new_v4().to_string(),
            iat,
            exp,
            iss: String::new(),
            sub: String::new(),
        }
    }

    pub fn with_issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = iss.into();
        self
    }

    pub fn with_subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = sub.into();
        self
    }
}
