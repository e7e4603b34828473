//! Account store layer — the backing document store behind the connection cache
//!
//! A [`Connector`] performs one physical connection attempt and yields a
//! [`StoreHandle`]. Handles are long-lived and shared; the
//! [`crate::ConnectionCache`] makes sure at most one is ever created per
//! process.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::identity::Account;

#[cfg(feature = "delta")]
pub mod delta;
pub mod memory;
#[cfg(feature = "delta")]
pub mod schema;

#[cfg(feature = "delta")]
pub use delta::{DeltaConnector, DeltaStore};
pub use memory::{MemoryConnector, MemoryStore};

/// Operations the auth layer (and external account flows) need from a store
#[async_trait]
pub trait AccountStore: std::fmt::Debug + Send + Sync {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// Cheap liveness probe
    async fn ping(&self) -> Result<()>;

    async fn find_account(&self, account_id: &str) -> Result<Option<Account>>;

    /// Insert or replace an account. Never called by the guard.
    async fn put_account(&self, account: Account) -> Result<()>;

    /// Remove an account; `true` if a record was deleted
    async fn delete_account(&self, account_id: &str) -> Result<bool>;
}

/// Live, reusable link to the account store
pub type StoreHandle = Arc<dyn AccountStore>;

/// Performs a single physical connection attempt
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &AuthConfig) -> Result<StoreHandle>;
}

/// Backend selected by the store URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUri {
    /// `memory://<name>`
    Memory(String),
    /// Delta table root (`file://`, `s3://`, `az://`, `gs://`, or a bare path)
    Delta(Url),
}

impl StoreUri {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Some(name) = raw.strip_prefix("memory://") {
            return Ok(Self::Memory(name.trim_end_matches('/').to_string()));
        }

        let mut url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let path = std::path::Path::new(raw);
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    std::env::current_dir()?.join(path)
                };
                Url::from_directory_path(&path).map_err(|_| {
                    AuthError::Config(format!("Invalid store path: {}", path.display()))
                })?
            }
            Err(e) => return Err(e.into()),
        };
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self::Delta(url))
    }

    pub fn scheme(&self) -> &str {
        match self {
            Self::Memory(_) => "memory",
            Self::Delta(url) => url.scheme(),
        }
    }
}

/// Pick the connector for the configured store URI
pub fn connector_for(config: &AuthConfig) -> Result<Arc<dyn Connector>> {
    match StoreUri::parse(&config.store_uri)? {
        StoreUri::Memory(name) => Ok(Arc::new(MemoryConnector::named(&name))),
        #[cfg(feature = "delta")]
        StoreUri::Delta(url) => Ok(Arc::new(DeltaConnector::new(url))),
        #[cfg(not(feature = "delta"))]
        StoreUri::Delta(url) => Err(AuthError::Config(format!(
            "store URI {url} needs the `delta` feature"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory_uri() {
        assert_eq!(
            StoreUri::parse("memory://dev").unwrap(),
            StoreUri::Memory("dev".into())
        );
    }

    #[test]
    fn test_parse_paths_and_urls() {
        let uri = StoreUri::parse("/data/chatops").unwrap();
        assert_eq!(uri, StoreUri::Delta(Url::parse("file:///data/chatops/").unwrap()));

        let uri = StoreUri::parse("s3://bucket/chatops").unwrap();
        assert_eq!(uri.scheme(), "s3");
        match uri {
            StoreUri::Delta(url) => assert_eq!(url.as_str(), "s3://bucket/chatops/"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
