use crate::models::{Session, SessionClaims};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "session";
pub const MIN_SECRET_LENGTH: usize = 32;

/// Issues and validates stateless HMAC-signed session tokens.
///
/// Revocation is done by the holder dropping its copy (the logout handler
/// clears the cookie). A token captured before logout stays valid until it
/// expires; there is no server-side revocation list.
#[derive(Clone)]
pub struct SessionStore {
    secret: Vec<u8>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn issue(&self, subject_id: &str) -> Session {
        self.issue_at(subject_id, Utc::now())
    }

    pub fn issue_at(&self, subject_id: &str, now: DateTime<Utc>) -> Session {
        // Whole seconds, so the claims round-trip exactly.
        let iat = now.timestamp();
        let exp = iat + self.ttl.num_seconds();
        let claims = SessionClaims {
            sub: subject_id.to_string(),
            iat,
            exp,
        };
        let payload = encode_claims(&claims);
        let signature = self.sign(payload.as_bytes());

        Session {
            subject_id: claims.sub,
            issued_at: DateTime::from_timestamp(iat, 0).unwrap_or(now),
            expires_at: DateTime::from_timestamp(exp, 0).unwrap_or(now),
            signature,
            payload,
        }
    }

    /// Returns the subject of a valid token. Tampered, malformed and expired
    /// tokens all yield `None`.
    pub fn validate(&self, token: &str) -> Option<String> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Option<String> {
        let (payload, signature) = token.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let claims: SessionClaims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).ok()?).ok()?;
        if claims.sub.is_empty() || now.timestamp() >= claims.exp {
            return None;
        }
        Some(claims.sub)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key size")
    }
}

fn encode_claims(claims: &SessionClaims) -> String {
    let json = serde_json::to_vec(claims).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}
