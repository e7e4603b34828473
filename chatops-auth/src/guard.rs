//! AuthGuard — request → verified [`Identity`] or a classified rejection
//!
//! Each call walks one strictly sequential path:
//!
//! ```text
//! Start → CredentialExtracted → ClaimsVerified → AccountResolved → Done
//! ```
//!
//! Any step may end the call with an [`AuthError`]. Nothing is retried here;
//! retry policy belongs to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::connection::ConnectionCache;
use crate::credential::codec::fingerprint;
use crate::credential::CredentialCodec;
use crate::error::{AuthError, Result};
use crate::identity::{Identity, IdentityResolver};
use crate::store::Connector;

/// Framework-free view of an inbound request
///
/// Header names are stored lower-cased.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    headers: HashMap<String, String>,
}

impl AuthRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Request carrying `Authorization: Bearer <token>`
    pub fn bearer(token: &str) -> Self {
        Self::new().with_header("Authorization", format!("Bearer {token}"))
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Token from a `Bearer <token>` authorization header
    ///
    /// A missing header, another scheme, or an empty token all yield `None`.
    pub fn bearer_token(&self) -> Option<&str> {
        self.header("authorization")?
            .trim()
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Step an `authenticate` call had reached, for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    Start,
    CredentialExtracted,
    ClaimsVerified,
    AccountResolved,
}

impl AuthStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::CredentialExtracted => "credential_extracted",
            Self::ClaimsVerified => "claims_verified",
            Self::AccountResolved => "account_resolved",
        }
    }
}

/// Composed entry point: extract, verify, resolve
#[derive(Debug, Clone)]
pub struct AuthGuard {
    codec: Arc<CredentialCodec>,
    resolver: IdentityResolver,
}

impl AuthGuard {
    /// Guard backed by the connector the store URI selects
    pub fn new(config: AuthConfig) -> Result<Self> {
        config.validate()?;
        let codec = CredentialCodec::new(&config);
        Ok(Self::from_parts(codec, ConnectionCache::from_config(config)?))
    }

    /// Guard with an explicit connector
    pub fn with_connector(config: AuthConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        config.validate()?;
        let codec = CredentialCodec::new(&config);
        Ok(Self::from_parts(codec, ConnectionCache::new(config, connector)))
    }

    pub fn from_parts(codec: CredentialCodec, connections: ConnectionCache) -> Self {
        Self {
            codec: Arc::new(codec),
            resolver: IdentityResolver::new(connections),
        }
    }

    pub fn codec(&self) -> &CredentialCodec {
        &self.codec
    }

    pub fn connections(&self) -> &ConnectionCache {
        self.resolver.connections()
    }

    /// Authenticate a request
    ///
    /// A request without a bearer credential is rejected before the codec or
    /// the store is touched.
    pub async fn authenticate(&self, request: &AuthRequest) -> Result<Identity> {
        let mut stage = AuthStage::Start;
        let outcome = self.run(request, &mut stage).await;
        if let Err(e) = &outcome {
            debug!(stage = stage.as_str(), kind = %e.kind(), error = %e, "Request rejected");
        }
        outcome
    }

    async fn run(&self, request: &AuthRequest, stage: &mut AuthStage) -> Result<Identity> {
        let token = request.bearer_token().ok_or(AuthError::NoCredential)?;
        *stage = AuthStage::CredentialExtracted;

        let claims = self.codec.verify(token)?;
        *stage = AuthStage::ClaimsVerified;

        let identity = self.resolver.load(&claims.subject_id).await?;
        *stage = AuthStage::AccountResolved;

        debug!(account_id = %identity.id, token = %fingerprint(token), "Request authenticated");
        Ok(identity)
    }

    /// Authenticate, then delete the caller's account entirely
    ///
    /// Returns the identity that was deleted.
    pub async fn delete_account(&self, request: &AuthRequest) -> Result<Identity> {
        let identity = self.authenticate(request).await?;
        self.resolver.delete(&identity.id).await?;
        info!(account_id = %identity.id, "Account deleted by owner");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_extraction() {
        assert_eq!(AuthRequest::bearer("abc").bearer_token(), Some("abc"));
        assert_eq!(
            AuthRequest::from_headers([("AUTHORIZATION", "Bearer  xyz ")]).bearer_token(),
            Some("xyz")
        );
        assert_eq!(AuthRequest::new().bearer_token(), None);
        assert_eq!(
            AuthRequest::new().with_header("Authorization", "Basic dXNlcjpwdw==").bearer_token(),
            None
        );
        assert_eq!(AuthRequest::new().with_header("Authorization", "Bearer ").bearer_token(), None);
        assert_eq!(AuthRequest::new().with_header("Authorization", "Bearer").bearer_token(), None);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(AuthStage::ClaimsVerified.as_str(), "claims_verified");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = AuthGuard::new(AuthConfig::new("memory://guard-unit", "")).unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }
}
