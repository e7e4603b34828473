//! In-process account store
//!
//! Backs `memory://<name>` URIs for local development and tests. Stores are
//! registered by name, so every connect to the same URI sees the same data
//! for the lifetime of the process.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::config::AuthConfig;
use crate::error::Result;
use crate::identity::Account;

use super::{AccountStore, Connector, StoreHandle};

static REGISTRY: OnceLock<Mutex<HashMap<String, Arc<MemoryStore>>>> = OnceLock::new();

/// `HashMap`-backed account store
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store registered under `name`, created on first use
    pub fn named(name: &str) -> Arc<Self> {
        let registry = REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
        Arc::clone(registry.lock().entry(name.to_string()).or_default())
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn find_account(&self, account_id: &str) -> Result<Option<Account>> {
        Ok(self.accounts.read().get(account_id).cloned())
    }

    async fn put_account(&self, account: Account) -> Result<()> {
        debug!(account_id = %account.id, "Account stored (memory)");
        self.accounts.write().insert(account.id.clone(), account);
        Ok(())
    }

    async fn delete_account(&self, account_id: &str) -> Result<bool> {
        Ok(self.accounts.write().remove(account_id).is_some())
    }
}

/// Connector that hands out one shared [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
}

impl MemoryConnector {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Connector for the registered store `name`
    pub fn named(name: &str) -> Self {
        Self::new(MemoryStore::named(name))
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, _config: &AuthConfig) -> Result<StoreHandle> {
        Ok(Arc::clone(&self.store) as StoreHandle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_find_delete() {
        let store = MemoryStore::new();
        store.put_account(Account::new("u1", "Alice", "alice@example.com")).await.unwrap();

        let found = store.find_account("u1").await.unwrap().unwrap();
        assert_eq!(found.email, "alice@example.com");
        assert!(store.find_account("u2").await.unwrap().is_none());

        assert!(store.delete_account("u1").await.unwrap());
        assert!(!store.delete_account("u1").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_named_stores_are_shared() {
        let a = MemoryStore::named("memory-tests-shared");
        let b = MemoryStore::named("memory-tests-shared");
        a.put_account(Account::new("u1", "Alice", "a@e.com")).await.unwrap();
        assert_eq!(b.len(), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &MemoryStore::named("memory-tests-other")));
    }
}
