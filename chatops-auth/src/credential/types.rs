//! Credential types — wire claims and the verified `Claims` record

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// JWT claims exactly as they travel inside a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (account id)
    pub sub: String,
    /// Issued at (Unix timestamp); tokens from other issuers may leave it out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiry (Unix timestamp)
    pub exp: i64,
}

/// Verified credential payload
///
/// Only produced by [`crate::CredentialCodec`] after the signature and
/// expiry checks have both passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub subject_id: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// True when `now` is at or past the expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl TryFrom<TokenClaims> for Claims {
    type Error = AuthError;

    fn try_from(raw: TokenClaims) -> Result<Self> {
        if raw.sub.is_empty() {
            return Err(AuthError::MalformedCredential("empty subject".into()));
        }
        let timestamp = |secs: i64, field: &str| {
            Utc.timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| AuthError::MalformedCredential(format!("{field} out of range")))
        };
        Ok(Self {
            issued_at: raw.iat.map(|iat| timestamp(iat, "iat")).transpose()?,
            expires_at: timestamp(raw.exp, "exp")?,
            subject_id: raw.sub,
        })
    }
}
