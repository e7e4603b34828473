//! Error types for chatops-auth — Railway Programming
//!
//! Every layer returns `Result<T, AuthError>`; nothing below the guard
//! swallows a failure. The guard is the one place a classified error is
//! turned into a transport status (see [`RejectionKind::status_code`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for credential, identity, and store operations
///
/// `Clone` so a single failed connection attempt can be handed to every
/// caller that was awaiting it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ─── Credential Errors ───

    #[error("No bearer credential supplied")]
    NoCredential,

    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    #[error("Credential signature is invalid")]
    InvalidSignature,

    #[error("Credential expired")]
    Expired,

    // ─── Identity Errors ───

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    // ─── Infrastructure Errors ───

    #[error("Account store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Field-less classification of an [`AuthError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionKind {
    NoCredential,
    MalformedCredential,
    InvalidSignature,
    Expired,
    AccountNotFound,
    StoreUnavailable,
    Internal,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCredential => "no_credential",
            Self::MalformedCredential => "malformed_credential",
            Self::InvalidSignature => "invalid_signature",
            Self::Expired => "expired",
            Self::AccountNotFound => "account_not_found",
            Self::StoreUnavailable => "store_unavailable",
            Self::Internal => "internal",
        }
    }

    /// HTTP status rendered for this kind
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NoCredential
            | Self::MalformedCredential
            | Self::InvalidSignature
            | Self::Expired => 401,
            Self::AccountNotFound => 404,
            Self::StoreUnavailable | Self::Internal => 500,
        }
    }

    /// True for the kinds that mean "the caller is not authenticated"
    pub fn is_unauthenticated(&self) -> bool {
        self.status_code() == 401
    }
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AuthError {
    /// Classify this error; anything not explicitly classified is `Internal`
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::NoCredential => RejectionKind::NoCredential,
            Self::MalformedCredential(_) => RejectionKind::MalformedCredential,
            Self::InvalidSignature => RejectionKind::InvalidSignature,
            Self::Expired => RejectionKind::Expired,
            Self::AccountNotFound(_) => RejectionKind::AccountNotFound,
            Self::StoreUnavailable(_) => RejectionKind::StoreUnavailable,
            Self::Config(_) | Self::Internal(_) => RejectionKind::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidKeyFormat
            | ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::RsaFailedSigning
            | ErrorKind::Crypto(_) => AuthError::Internal(err.to_string()),
            _ => AuthError::MalformedCredential(err.to_string()),
        }
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::StoreUnavailable(format!("IO error: {err}"))
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Internal(format!("Serialization error: {err}"))
    }
}

impl From<url::ParseError> for AuthError {
    fn from(err: url::ParseError) -> Self {
        AuthError::Config(format!("URL parse error: {err}"))
    }
}

#[cfg(feature = "delta")]
impl From<deltalake::DeltaTableError> for AuthError {
    fn from(err: deltalake::DeltaTableError) -> Self {
        AuthError::StoreUnavailable(format!("Delta table error: {err}"))
    }
}

#[cfg(feature = "delta")]
impl From<deltalake::arrow::error::ArrowError> for AuthError {
    fn from(err: deltalake::arrow::error::ArrowError) -> Self {
        AuthError::StoreUnavailable(format!("Arrow error: {err}"))
    }
}

#[cfg(feature = "delta")]
impl From<deltalake::datafusion::error::DataFusionError> for AuthError {
    fn from(err: deltalake::datafusion::error::DataFusionError) -> Self {
        AuthError::StoreUnavailable(format!("DataFusion error: {err}"))
    }
}

/// Result type alias for auth operations
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::NoCredential.status_code(), 401);
        assert_eq!(AuthError::Expired.status_code(), 401);
        assert_eq!(AuthError::InvalidSignature.status_code(), 401);
        assert_eq!(AuthError::MalformedCredential("x".into()).status_code(), 401);
        assert_eq!(AuthError::AccountNotFound("u1".into()).status_code(), 404);
        assert_eq!(AuthError::StoreUnavailable("down".into()).status_code(), 500);
        assert_eq!(AuthError::Config("missing".into()).status_code(), 500);
    }

    #[test]
    fn test_unclassified_falls_into_internal() {
        assert_eq!(AuthError::Config("x".into()).kind(), RejectionKind::Internal);
        assert_eq!(AuthError::Internal("x".into()).kind(), RejectionKind::Internal);
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&RejectionKind::AccountNotFound).unwrap();
        assert_eq!(json, "\"AccountNotFound\"");
        assert!(RejectionKind::Expired.is_unauthenticated());
        assert!(!RejectionKind::StoreUnavailable.is_unauthenticated());
    }
}
