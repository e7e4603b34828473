//! ConnectionCache — one shared account-store handle per process
//!
//! Request handlers are short-lived and many run at once; they must not each
//! open a store connection. The cache collapses concurrent first callers onto
//! a single in-flight attempt:
//!
//! ```text
//!   Idle ──get()──▶ Connecting(shared attempt) ──ok──▶ Ready(handle)
//!    ▲                      │
//!    └──────── err ─────────┘   (every waiter sees the same error)
//! ```
//!
//! Each attempt runs on its own tokio task, so it finishes (and its timeout
//! is measured) whether or not anyone is still awaiting it. The transition out
//! of `Connecting` is made by the attempt itself, exactly once, so a failed or
//! abandoned attempt never wedges later callers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::store::{connector_for, Connector, StoreHandle};

type ConnectAttempt = Shared<BoxFuture<'static, Result<StoreHandle>>>;

enum Slot {
    Idle,
    Connecting { attempt: u64, future: ConnectAttempt },
    Ready(StoreHandle),
}

/// Observable cache state, for diagnostics and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Idle,
    Connecting,
    Ready,
}

struct Inner {
    config: AuthConfig,
    connector: Arc<dyn Connector>,
    slot: Mutex<Slot>,
    attempts: AtomicU64,
}

/// Process-scoped, lazily connected store handle
///
/// Cheap to clone; clones share the same slot.
#[derive(Clone)]
pub struct ConnectionCache {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ConnectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCache")
            .field("store_uri", &self.inner.config.store_uri)
            .field("state", &self.state())
            .field("attempts", &self.attempts())
            .finish()
    }
}

impl ConnectionCache {
    pub fn new(config: AuthConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                connector,
                slot: Mutex::new(Slot::Idle),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    /// Cache using the connector chosen by the configured store URI
    pub fn from_config(config: AuthConfig) -> Result<Self> {
        let connector = connector_for(&config)?;
        Ok(Self::new(config, connector))
    }

    /// Get the shared store handle, connecting on first use
    ///
    /// Concurrent callers during a connect all await the same attempt and
    /// observe the same outcome. Failures surface as `StoreUnavailable`.
    pub async fn get(&self) -> Result<StoreHandle> {
        let attempt = {
            let mut slot = self.inner.slot.lock();
            match &*slot {
                Slot::Ready(handle) => return Ok(Arc::clone(handle)),
                Slot::Connecting { future, .. } => future.clone(),
                Slot::Idle => {
                    let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    let future = self.spawn_attempt(attempt);
                    *slot = Slot::Connecting { attempt, future: future.clone() };
                    future
                }
            }
        };
        attempt.await
    }

    pub fn state(&self) -> CacheState {
        match &*self.inner.slot.lock() {
            Slot::Idle => CacheState::Idle,
            Slot::Connecting { .. } => CacheState::Connecting,
            Slot::Ready(_) => CacheState::Ready,
        }
    }

    /// Number of physical connection attempts started so far
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &AuthConfig {
        &self.inner.config
    }

    /// Start attempt number `attempt` on a background task
    ///
    /// The returned future only observes the task. A panicked or cancelled
    /// task still resets the slot so the next caller can retry.
    fn spawn_attempt(&self, attempt: u64) -> ConnectAttempt {
        let cache = Arc::downgrade(&self.inner);
        let task = tokio::spawn(Self::establish(
            cache.clone(),
            self.inner.config.clone(),
            Arc::clone(&self.inner.connector),
            attempt,
        ));

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    let err = AuthError::StoreUnavailable(format!("connect task failed: {e}"));
                    warn!(attempt, error = %err, "Connect task aborted; cache reset");
                    Self::settle(&cache, attempt, &Err(err.clone()));
                    Err(err)
                }
            }
        }
        .boxed()
        .shared()
    }

    async fn establish(
        cache: Weak<Inner>,
        config: AuthConfig,
        connector: Arc<dyn Connector>,
        attempt: u64,
    ) -> Result<StoreHandle> {
        info!(attempt, store = %config.store_uri, "Connecting to account store");

        let result = match timeout(config.connect_timeout, connector.connect(&config)).await {
            Ok(Ok(handle)) => Ok(handle),
            Ok(Err(AuthError::StoreUnavailable(msg))) => Err(AuthError::StoreUnavailable(msg)),
            Ok(Err(other)) => Err(AuthError::StoreUnavailable(other.to_string())),
            Err(_) => Err(AuthError::StoreUnavailable(format!(
                "connect timed out after {:?}",
                config.connect_timeout
            ))),
        };

        match &result {
            Ok(handle) => info!(attempt, backend = handle.backend(), "Account store connected"),
            Err(e) => warn!(attempt, error = %e, "Account store connect failed; cache reset"),
        }

        Self::settle(&cache, attempt, &result);
        result
    }

    /// Move the slot out of `Connecting` if `attempt` is still the current one
    fn settle(cache: &Weak<Inner>, attempt: u64, result: &Result<StoreHandle>) {
        let Some(inner) = cache.upgrade() else {
            return;
        };
        let mut slot = inner.slot.lock();
        let current = matches!(&*slot, Slot::Connecting { attempt: a, .. } if *a == attempt);
        if current {
            *slot = match result {
                Ok(handle) => Slot::Ready(Arc::clone(handle)),
                Err(_) => Slot::Idle,
            };
        } else {
            debug!(attempt, "Stale connect attempt finished; slot untouched");
        }
    }
}
