use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Claims carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// A signed, time-bounded operator session. Nothing is kept server-side;
/// the token itself is the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub subject_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub signature: Vec<u8>,
    pub(crate) payload: String,
}

impl Session {
    /// Wire form: `base64url(claims).base64url(signature)`.
    pub fn token(&self) -> String {
        format!("{}.{}", self.payload, URL_SAFE_NO_PAD.encode(&self.signature))
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn lifetime_secs(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds().max(0)
    }
}
