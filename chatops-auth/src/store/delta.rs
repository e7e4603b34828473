//! DeltaStore — account store on a Delta Lake table
//!
//! One `accounts` table under the configured root. Local roots are created on
//! first connect; remote roots (`s3://`, `az://`, `gs://`) must already hold
//! the table and are opened with bounded object-store client timeouts.
//!
//! The table, its log store, and the object-store client behind it are built
//! once in [`DeltaStore::open`] and live as long as the handle. Each operation
//! only refreshes the snapshot when the log has moved on.
//!
//! # Example
//!
//! ```rust,no_run
//! use chatops_auth::{AuthConfig, ConnectionCache};
//! use chatops_auth::store::connector_for;
//!
//! #[tokio::main]
//! async fn main() -> chatops_auth::Result<()> {
//!     let config = AuthConfig::new("/data/chatops", "my-production-secret");
//!     let cache = ConnectionCache::new(config.clone(), connector_for(&config)?);
//!
//!     let store = cache.get().await?;
//!     let account = store.find_account("u1").await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use deltalake::arrow::array::{Array, RecordBatch, StringArray};
use deltalake::datafusion::catalog::TableProvider;
use deltalake::datafusion::prelude::{col, lit, Expr, SessionContext};
use deltalake::logstore::LogStoreRef;
use deltalake::writer::{DeltaWriter, RecordBatchWriter};
use deltalake::DeltaTable;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::identity::{Account, StoredCloudCredentials};

use super::schema::{self, TABLE_ACCOUNTS};
use super::{AccountStore, Connector, StoreHandle};

/// Accounts table handle
///
/// Thread-safe: shared across tokio tasks as a [`StoreHandle`]. Writers are
/// serialized on the table lock; readers hold it only while refreshing.
pub struct DeltaStore {
    table_url: Url,
    table: Mutex<DeltaTable>,
    ctx: SessionContext,
}

impl std::fmt::Debug for DeltaStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeltaStore")
            .field("table_url", &self.table_url)
            .finish_non_exhaustive()
    }
}

impl DeltaStore {
    /// Open (creating locally if needed) the accounts table under `root`
    pub async fn open(root: &Url, config: &AuthConfig) -> Result<Self> {
        let table_url = root.join(&format!("{TABLE_ACCOUNTS}/"))?;
        let options = Self::client_options(&table_url, config);
        let table = Self::open_or_create(&table_url, options).await?;
        info!(table = %table_url, version = ?table.version(), "Account store opened");

        Ok(Self {
            table_url,
            table: Mutex::new(table),
            ctx: SessionContext::new(),
        })
    }

    /// Object-store client options carrying the configured timeouts
    ///
    /// Local tables have no sockets, so they get none.
    fn client_options(table_url: &Url, config: &AuthConfig) -> HashMap<String, String> {
        if table_url.scheme() == "file" {
            return HashMap::new();
        }
        HashMap::from([
            (
                "connect_timeout".to_string(),
                format!("{}ms", config.connect_timeout.as_millis()),
            ),
            (
                "pool_idle_timeout".to_string(),
                format!("{}ms", config.socket_timeout.as_millis()),
            ),
        ])
    }

    pub fn table_url(&self) -> &Url {
        &self.table_url
    }

    /// Log store shared by every operation on this handle
    pub async fn log_store(&self) -> LogStoreRef {
        self.table.lock().await.log_store()
    }

    async fn open_or_create(table_url: &Url, options: HashMap<String, String>) -> Result<DeltaTable> {
        let local = table_url.scheme() == "file";
        if local {
            let path = table_url
                .to_file_path()
                .map_err(|_| AuthError::Config(format!("Invalid table path: {table_url}")))?;
            std::fs::create_dir_all(&path)?;
        }

        let table = DeltaTable::try_from_url_with_storage_options(table_url.clone(), options).await?;
        if table.version().is_some() {
            debug!(table = TABLE_ACCOUNTS, version = ?table.version(), "Table already exists");
            return Ok(table);
        }
        if !local {
            return Err(AuthError::StoreUnavailable(format!(
                "no {TABLE_ACCOUNTS} table at {table_url}"
            )));
        }

        let table = table
            .create()
            .with_table_name(TABLE_ACCOUNTS)
            .with_save_mode(deltalake::protocol::SaveMode::Ignore)
            .with_columns(schema::accounts_delta_fields())
            .await?;
        info!(table = TABLE_ACCOUNTS, "Created Delta table");
        Ok(table)
    }

    /// Bring the loaded snapshot up to the latest committed version
    async fn refresh(table: &mut DeltaTable) -> Result<()> {
        let latest = table.get_latest_version().await?;
        if table.version() != Some(latest) {
            table.update_incremental(None).await?;
            debug!(table = TABLE_ACCOUNTS, version = latest, "Snapshot refreshed");
        }
        Ok(())
    }

    /// Fresh snapshot sharing this handle's log store
    async fn snapshot(&self) -> Result<DeltaTable> {
        let mut table = self.table.lock().await;
        Self::refresh(&mut table).await?;
        Ok(table.clone())
    }

    /// Current table version
    pub async fn version(&self) -> Result<i64> {
        Ok(self.snapshot().await?.version().unwrap_or(0))
    }

    async fn rows_for(&self, account_id: &str) -> Result<Vec<RecordBatch>> {
        let provider: Arc<dyn TableProvider> = Arc::new(self.snapshot().await?);
        let batches = self
            .ctx
            .read_table(provider)?
            .filter(Self::id_predicate(account_id))?
            .collect()
            .await?;

        debug!(table = TABLE_ACCOUNTS, account_id, "Lookup executed");
        Ok(batches)
    }

    async fn append_locked(table: &mut DeltaTable, batch: RecordBatch) -> Result<i64> {
        let mut writer = RecordBatchWriter::for_table(table)?;
        writer.write(batch).await?;
        let version = writer.flush_and_commit(table).await?;

        debug!(table = TABLE_ACCOUNTS, version, "Appended records");
        Ok(version)
    }

    async fn delete_locked(table: &mut DeltaTable, predicate: Expr) -> Result<usize> {
        let (updated, metrics) = table.clone().delete().with_predicate(predicate).await?;
        *table = updated;

        debug!(
            table = TABLE_ACCOUNTS,
            deleted = metrics.num_deleted_rows,
            version = ?table.version(),
            "Deleted records"
        );
        Ok(metrics.num_deleted_rows)
    }

    fn extract_account(batch: &RecordBatch, i: usize) -> Account {
        let get_opt_str = |col: usize| -> Option<String> {
            batch
                .column(col)
                .as_any()
                .downcast_ref::<StringArray>()
                .and_then(|a| (!a.is_null(i)).then(|| a.value(i).to_string()))
        };

        let access_key = get_opt_str(schema::COL_AWS_ACCESS_KEY);
        let secret_key = get_opt_str(schema::COL_AWS_SECRET_KEY);
        let region = get_opt_str(schema::COL_AWS_REGION);
        let aws_credentials = (access_key.is_some() || secret_key.is_some() || region.is_some())
            .then_some(StoredCloudCredentials { access_key, secret_key, region });

        Account {
            id: get_opt_str(schema::COL_ACCOUNT_ID).unwrap_or_default(),
            name: get_opt_str(schema::COL_NAME).unwrap_or_default(),
            email: get_opt_str(schema::COL_EMAIL).unwrap_or_default(),
            aws_credentials,
            created_at: get_opt_str(schema::COL_CREATED_AT).unwrap_or_default(),
        }
    }

    /// `account_id = <id>` as a typed expression, so ids are never spliced into SQL
    fn id_predicate(account_id: &str) -> Expr {
        col(schema::ACCOUNT_ID).eq(lit(account_id))
    }
}

#[async_trait]
impl AccountStore for DeltaStore {
    fn backend(&self) -> &'static str {
        "delta"
    }

    async fn ping(&self) -> Result<()> {
        let table = self.snapshot().await?;
        if !table.verify_deltatable_existence().await? {
            return Err(AuthError::StoreUnavailable(format!(
                "{TABLE_ACCOUNTS} table missing at {}",
                self.table_url
            )));
        }
        Ok(())
    }

    async fn find_account(&self, account_id: &str) -> Result<Option<Account>> {
        let batches = self.rows_for(account_id).await?;

        Ok(batches
            .iter()
            .flat_map(|b| (0..b.num_rows()).map(move |i| (b, i)))
            .next()
            .map(|(batch, i)| Self::extract_account(batch, i)))
    }

    async fn put_account(&self, account: Account) -> Result<()> {
        let batch = schema::account_batch(&account)?;
        let mut table = self.table.lock().await;
        Self::refresh(&mut table).await?;

        // Replace semantics: drop any previous row before appending.
        Self::delete_locked(&mut table, Self::id_predicate(&account.id)).await?;
        let version = Self::append_locked(&mut table, batch).await?;
        info!(account_id = %account.id, version, "Account stored");
        Ok(())
    }

    async fn delete_account(&self, account_id: &str) -> Result<bool> {
        let mut table = self.table.lock().await;
        Self::refresh(&mut table).await?;
        let deleted = Self::delete_locked(&mut table, Self::id_predicate(account_id)).await?;
        info!(account_id, deleted, "Account delete executed");
        Ok(deleted > 0)
    }
}

/// Connector that opens the accounts table under a root URL
#[derive(Debug, Clone)]
pub struct DeltaConnector {
    root: Url,
}

impl DeltaConnector {
    pub fn new(root: Url) -> Self {
        Self { root }
    }
}

#[async_trait]
impl Connector for DeltaConnector {
    async fn connect(&self, config: &AuthConfig) -> Result<StoreHandle> {
        let store = DeltaStore::open(&self.root, config).await?;
        Ok(Arc::new(store) as StoreHandle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_options_only_for_remote_tables() {
        let config = AuthConfig::new("s3://bucket/chatops", "s")
            .with_connect_timeout(Duration::from_millis(1500))
            .with_socket_timeout(Duration::from_secs(30));

        let remote = Url::parse("s3://bucket/chatops/accounts/").unwrap();
        let opts = DeltaStore::client_options(&remote, &config);
        assert_eq!(opts.get("connect_timeout").map(String::as_str), Some("1500ms"));
        assert_eq!(opts.get("pool_idle_timeout").map(String::as_str), Some("30000ms"));

        let local = Url::parse("file:///tmp/chatops/accounts/").unwrap();
        assert!(DeltaStore::client_options(&local, &config).is_empty());
    }
}
