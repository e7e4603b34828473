//! Identity domain types — Account (stored) and Identity (projected)

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_REGION;

/// Cloud credentials as stored on an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCloudCredentials {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: Option<String>,
}

/// Account record — full data as owned by the account store
///
/// Read-only from the guard's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub aws_credentials: Option<StoredCloudCredentials>,
    pub created_at: String,
}

impl Account {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            aws_credentials: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_aws_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        self.aws_credentials = Some(StoredCloudCredentials {
            access_key: Some(access_key.into()),
            secret_key: Some(secret_key.into()),
            region: Some(region.into()),
        });
        self
    }
}

/// Public view of an account's cloud credentials
///
/// Always present on an [`Identity`]. `secret_key` is part of the stable
/// shape but is never populated by the projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudCredentialsView {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub region: String,
}

impl CloudCredentialsView {
    /// The shape reported for accounts with no stored credentials
    pub fn unconfigured(region: impl Into<String>) -> Self {
        Self {
            access_key: None,
            secret_key: None,
            region: region.into(),
        }
    }

    /// Project stored credentials, dropping the secret
    pub fn project(stored: Option<&StoredCloudCredentials>, default_region: &str) -> Self {
        match stored {
            Some(creds) => Self {
                access_key: creds.access_key.clone(),
                secret_key: None,
                region: creds
                    .region
                    .clone()
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| default_region.to_string()),
            },
            None => Self::unconfigured(default_region),
        }
    }
}

impl Default for CloudCredentialsView {
    fn default() -> Self {
        Self::unconfigured(DEFAULT_REGION)
    }
}

/// Safe-to-return projection of an [`Account`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub aws_credentials: CloudCredentialsView,
}

impl Identity {
    pub fn project(account: &Account, default_region: &str) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            aws_credentials: CloudCredentialsView::project(
                account.aws_credentials.as_ref(),
                default_region,
            ),
        }
    }
}
