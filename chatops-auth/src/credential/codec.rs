//! CredentialCodec — issue and verify HS256 bearer tokens
//!
//! # Usage
//!
//! ```rust
//! use chatops_auth::{AuthConfig, CredentialCodec};
//!
//! let codec = CredentialCodec::new(&AuthConfig::new("memory://docs", "my-production-secret"));
//! let token = codec.issue("u1").unwrap();
//! let claims = codec.verify(&token).unwrap();
//! assert_eq!(claims.subject_id, "u1");
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};

use super::types::{Claims, TokenClaims};

/// Encodes, decodes, and verifies bearer credentials against one shared secret
#[derive(Clone)]
pub struct CredentialCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl std::fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCodec")
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}

impl CredentialCodec {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();

        // Expiry is checked by hand so `now == exp` is already expired.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            token_ttl: config.token_ttl,
        }
    }

    /// Issue a credential for `subject_id` with the configured lifetime
    pub fn issue(&self, subject_id: &str) -> Result<String> {
        self.issue_with_ttl(subject_id, self.token_ttl)
    }

    /// Issue a credential with an explicit lifetime
    pub fn issue_with_ttl(&self, subject_id: &str, ttl: Duration) -> Result<String> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AuthError::Internal(format!("token TTL out of range: {e}")))?;
        self.issue_at(subject_id, Utc::now(), Utc::now() + ttl)
    }

    /// Issue a credential with explicit issue and expiry instants
    pub fn issue_at(
        &self,
        subject_id: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String> {
        let claims = TokenClaims {
            sub: subject_id.to_string(),
            iat: Some(issued_at.timestamp()),
            exp: expires_at.timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verify `raw` against the current time
    pub fn verify(&self, raw: &str) -> Result<Claims> {
        self.verify_at(raw, Utc::now())
    }

    /// Verify `raw` as of `now`
    ///
    /// Signature is checked before expiry, so a tampered expired token is
    /// `InvalidSignature`, never `Expired`.
    pub fn verify_at(&self, raw: &str, now: DateTime<Utc>) -> Result<Claims> {
        let raw = raw.trim();
        if raw.is_empty() || raw.split('.').count() != 3 {
            return Err(AuthError::MalformedCredential(
                "expected three dot-separated segments".into(),
            ));
        }

        let data = decode::<TokenClaims>(raw, &self.decoding, &self.validation)?;
        let claims = Claims::try_from(data.claims)?;

        if claims.is_expired_at(now) {
            debug!(
                token = %fingerprint(raw),
                expired_at = %claims.expires_at,
                "Credential expired"
            );
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

/// Short SHA-256 fingerprint of a token, safe to put in logs
pub fn fingerprint(raw: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(raw.as_bytes()));
    digest[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn codec(secret: &str) -> CredentialCodec {
        CredentialCodec::new(&AuthConfig::new("memory://codec-tests", secret))
    }

    #[test]
    fn test_issue_and_verify() {
        let c = codec("test-secret-jwt-key-min-32-chars!!");
        let token = c.issue("u1").unwrap();
        let claims = c.verify(&token).unwrap();
        assert_eq!(claims.subject_id, "u1");
        assert!(claims.issued_at.is_some_and(|iat| claims.expires_at > iat));
    }

    #[test]
    fn test_subject_extracted_verbatim() {
        let c = codec("s");
        let token = c.issue("acct:O'Brien/42").unwrap();
        assert_eq!(c.verify(&token).unwrap().subject_id, "acct:O'Brien/42");
    }

    #[test]
    fn test_expired_at_boundary() {
        let c = codec("s");
        let iat = Utc.timestamp_opt(1_000, 0).unwrap();
        let exp = Utc.timestamp_opt(2_000, 0).unwrap();
        let token = c.issue_at("u1", iat, exp).unwrap();

        assert!(c.verify_at(&token, Utc.timestamp_opt(1_999, 0).unwrap()).is_ok());
        assert_eq!(c.verify_at(&token, exp).unwrap_err(), AuthError::Expired);
        assert_eq!(
            c.verify_at(&token, Utc.timestamp_opt(5_000, 0).unwrap()).unwrap_err(),
            AuthError::Expired
        );
    }

    #[test]
    fn test_token_without_iat_verifies() {
        #[derive(serde::Serialize)]
        struct Minimal<'a> {
            sub: &'a str,
            exp: i64,
        }

        let c = codec("s");
        let exp = (Utc::now() + chrono::Duration::hours(1)).timestamp();
        let token = encode(&Header::new(Algorithm::HS256), &Minimal { sub: "u1", exp }, &c.encoding).unwrap();

        let claims = c.verify(&token).unwrap();
        assert_eq!(claims.subject_id, "u1");
        assert_eq!(claims.issued_at, None);
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let token = codec("secret-a").issue("u1").unwrap();
        assert_eq!(codec("secret-b").verify(&token).unwrap_err(), AuthError::InvalidSignature);
    }

    #[test]
    fn test_tampered_expired_token_is_invalid_signature() {
        let signer = codec("secret-a");
        let past = Utc.timestamp_opt(10, 0).unwrap();
        let expired = signer.issue_at("u1", past, past).unwrap();
        assert_eq!(codec("secret-b").verify(&expired).unwrap_err(), AuthError::InvalidSignature);
    }

    #[test]
    fn test_malformed_inputs() {
        let c = codec("s");
        for raw in ["", "   ", "not-a-token", "a.b", "a.b.c.d", "!!!.???.###"] {
            let err = c.verify(raw).unwrap_err();
            assert!(
                matches!(err, AuthError::MalformedCredential(_)),
                "{raw:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        assert_eq!(fingerprint("abc"), fingerprint("abc"));
        assert_eq!(fingerprint("abc").len(), 12);
        assert_ne!(fingerprint("abc"), fingerprint("abd"));
    }
}
