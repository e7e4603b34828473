//! Configuration for chatops-auth

use std::time::Duration;

use crate::error::{AuthError, Result};

/// Environment variable holding the account store URI (required)
pub const ENV_STORE_URI: &str = "CHATOPS_STORE_URI";
/// Environment variable holding the credential signing secret (required)
pub const ENV_JWT_SECRET: &str = "CHATOPS_JWT_SECRET";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "CHATOPS_CONNECT_TIMEOUT_MS";
pub const ENV_SOCKET_TIMEOUT_MS: &str = "CHATOPS_SOCKET_TIMEOUT_MS";
pub const ENV_TOKEN_TTL_SECS: &str = "CHATOPS_TOKEN_TTL_SECS";

/// Region reported for accounts that never stored cloud credentials
pub const DEFAULT_REGION: &str = "us-east-1";

/// Auth configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Account store URI: `memory://<name>`, a local path, or an object-store URL
    pub store_uri: String,

    /// Shared HS256 secret for credential signing and verification
    pub jwt_secret: String,

    /// Upper bound on establishing the store connection
    pub connect_timeout: Duration,

    /// Idle timeout for pooled store sockets
    pub socket_timeout: Duration,

    /// Lifetime of credentials issued by [`crate::CredentialCodec::issue`]
    pub token_ttl: Duration,

    /// Region substituted when an account has no cloud credentials
    pub default_region: String,
}

impl AuthConfig {
    /// Create config with sensible defaults
    ///
    /// Connect timeout 5 s, socket idle timeout 45 s, token lifetime 7 days.
    pub fn new(store_uri: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            store_uri: store_uri.into(),
            jwt_secret: jwt_secret.into(),
            connect_timeout: Duration::from_secs(5),
            socket_timeout: Duration::from_secs(45),
            token_ttl: Duration::from_secs(7 * 24 * 3600),
            default_region: DEFAULT_REGION.to_string(),
        }
    }

    /// Load from the process environment
    ///
    /// A missing store URI or secret is fatal at startup, so this returns
    /// `AuthError::Config` instead of falling back to a default.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AuthError::Config(format!("{key} must be set")))
        };
        let optional_u64 = |key: &str| -> Result<Option<u64>> {
            match lookup(key) {
                None => Ok(None),
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|e| AuthError::Config(format!("{key}={raw:?}: {e}"))),
            }
        };

        let mut config = Self::new(required(ENV_STORE_URI)?, required(ENV_JWT_SECRET)?);
        if let Some(ms) = optional_u64(ENV_CONNECT_TIMEOUT_MS)? {
            config = config.with_connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = optional_u64(ENV_SOCKET_TIMEOUT_MS)? {
            config = config.with_socket_timeout(Duration::from_millis(ms));
        }
        if let Some(secs) = optional_u64(ENV_TOKEN_TTL_SECS)? {
            config = config.with_token_ttl(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    /// Override the connection-establishment timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the idle-socket timeout
    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    /// Override issued credential lifetime
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Override the fallback cloud region
    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = region.into();
        self
    }

    /// Reject configurations that could never serve a request
    pub fn validate(&self) -> Result<()> {
        if self.store_uri.trim().is_empty() {
            return Err(AuthError::Config("store URI is empty".into()));
        }
        if self.jwt_secret.is_empty() {
            return Err(AuthError::Config("JWT secret is empty".into()));
        }
        if self.connect_timeout.is_zero() || self.socket_timeout.is_zero() {
            return Err(AuthError::Config("store timeouts must be finite and non-zero".into()));
        }
        if self.token_ttl.is_zero() {
            return Err(AuthError::Config("token TTL must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let cfg = AuthConfig::new("memory://default", "secret");
        assert_eq!(cfg.connect_timeout, Duration::from_secs(5));
        assert_eq!(cfg.socket_timeout, Duration::from_secs(45));
        assert_eq!(cfg.default_region, "us-east-1");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let cfg = AuthConfig::new("/data/accounts", "my-secret")
            .with_connect_timeout(Duration::from_millis(250))
            .with_socket_timeout(Duration::from_secs(10))
            .with_token_ttl(Duration::from_secs(60))
            .with_default_region("eu-west-1");

        assert_eq!(cfg.connect_timeout, Duration::from_millis(250));
        assert_eq!(cfg.socket_timeout, Duration::from_secs(10));
        assert_eq!(cfg.token_ttl, Duration::from_secs(60));
        assert_eq!(cfg.default_region, "eu-west-1");
    }

    #[test]
    fn test_missing_required_values_are_fatal() {
        let err = AuthConfig::from_lookup(lookup_from(&[(ENV_JWT_SECRET, "s")])).unwrap_err();
        assert!(matches!(err, AuthError::Config(ref m) if m.contains(ENV_STORE_URI)));

        let err = AuthConfig::from_lookup(lookup_from(&[(ENV_STORE_URI, "memory://x")])).unwrap_err();
        assert!(matches!(err, AuthError::Config(ref m) if m.contains(ENV_JWT_SECRET)));

        let err = AuthConfig::from_lookup(lookup_from(&[
            (ENV_STORE_URI, "memory://x"),
            (ENV_JWT_SECRET, "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }

    #[test]
    fn test_optional_overrides() {
        let cfg = AuthConfig::from_lookup(lookup_from(&[
            (ENV_STORE_URI, "memory://x"),
            (ENV_JWT_SECRET, "s"),
            (ENV_CONNECT_TIMEOUT_MS, "1500"),
            (ENV_TOKEN_TTL_SECS, "3600"),
        ]))
        .unwrap();
        assert_eq!(cfg.connect_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.socket_timeout, Duration::from_secs(45));
        assert_eq!(cfg.token_ttl, Duration::from_secs(3600));

        let bad = AuthConfig::from_lookup(lookup_from(&[
            (ENV_STORE_URI, "memory://x"),
            (ENV_JWT_SECRET, "s"),
            (ENV_SOCKET_TIMEOUT_MS, "soon"),
        ]));
        assert!(bad.is_err());

        let zero = AuthConfig::from_lookup(lookup_from(&[
            (ENV_STORE_URI, "memory://x"),
            (ENV_JWT_SECRET, "s"),
            (ENV_CONNECT_TIMEOUT_MS, "0"),
        ]));
        assert!(zero.is_err());
    }
}
