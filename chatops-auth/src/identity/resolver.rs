//! IdentityResolver — subject id → projected [`Identity`]
//!
//! Every lookup goes through the injected [`ConnectionCache`]; the resolver
//! never opens a connection of its own.

use tracing::{debug, info};

use crate::connection::ConnectionCache;
use crate::error::{AuthError, Result};

use super::types::{Account, Identity};

#[derive(Debug, Clone)]
pub struct IdentityResolver {
    connections: ConnectionCache,
    default_region: String,
}

impl IdentityResolver {
    pub fn new(connections: ConnectionCache) -> Self {
        let default_region = connections.config().default_region.clone();
        Self { connections, default_region }
    }

    /// Load the account for `subject_id` and project it
    pub async fn load(&self, subject_id: &str) -> Result<Identity> {
        let account = self.find(subject_id).await?;
        Ok(Identity::project(&account, &self.default_region))
    }

    /// Delete the account for `subject_id` entirely
    pub async fn delete(&self, subject_id: &str) -> Result<()> {
        let store = self.connections.get().await?;
        if !store.delete_account(subject_id).await? {
            return Err(AuthError::AccountNotFound(subject_id.to_string()));
        }
        info!(account_id = subject_id, "Account deleted");
        Ok(())
    }

    async fn find(&self, subject_id: &str) -> Result<Account> {
        let store = self.connections.get().await?;
        match store.find_account(subject_id).await? {
            Some(account) => Ok(account),
            None => {
                debug!(account_id = subject_id, backend = store.backend(), "Account not found");
                Err(AuthError::AccountNotFound(subject_id.to_string()))
            }
        }
    }

    pub fn connections(&self) -> &ConnectionCache {
        &self.connections
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::AuthConfig;
    use crate::store::{AccountStore, MemoryConnector, MemoryStore};

    fn resolver_with(store: Arc<MemoryStore>) -> IdentityResolver {
        IdentityResolver::new(ConnectionCache::new(
            AuthConfig::new("memory://resolver-unit", "s"),
            Arc::new(MemoryConnector::new(store)),
        ))
    }

    #[tokio::test]
    async fn test_load_projects_account() {
        let store = Arc::new(MemoryStore::new());
        store
            .put_account(Account::new("u1", "Alice", "alice@example.com"))
            .await
            .unwrap();
        let identity = resolver_with(store).load("u1").await.unwrap();
        assert_eq!(identity.name, "Alice");
        assert_eq!(identity.aws_credentials.region, "us-east-1");
    }

    #[tokio::test]
    async fn test_missing_account() {
        let resolver = resolver_with(Arc::new(MemoryStore::new()));
        assert_eq!(
            resolver.load("ghost").await.unwrap_err(),
            AuthError::AccountNotFound("ghost".into())
        );
        assert_eq!(
            resolver.delete("ghost").await.unwrap_err(),
            AuthError::AccountNotFound("ghost".into())
        );
    }

    #[tokio::test]
    async fn test_load_does_not_mutate_account() {
        let store = Arc::new(MemoryStore::new());
        let account = Account::new("u1", "Alice", "a@e.com").with_aws_credentials("AK", "SK", "us-west-2");
        store.put_account(account.clone()).await.unwrap();

        resolver_with(Arc::clone(&store)).load("u1").await.unwrap();
        assert_eq!(store.find_account("u1").await.unwrap(), Some(account));
    }
}
