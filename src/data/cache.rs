//! In-memory account cache
//!
//! Volatile and cleared on restart. Uses Moka for concurrent caching.
//! The identity store reads through it and writes every mutated
//! account back into it, so a cached entry is never older than the
//! last write made through this process.
//!
//! Account writes and cache fills hold `write_guard()` from the
//! database statement until the row is in the cache. Without it two
//! writers could persist in one order and fill the cache in the other.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

use super::models::Account;

/// Account id -> latest persisted account row
pub struct AccountCache {
    accounts: Cache<i64, Arc<Account>>,
    writes: Mutex<()>,
}

impl AccountCache {
    /// Create new account cache
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of accounts kept
    /// * `ttl` - How long an entry lives before it is re-read
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let accounts = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self {
            accounts,
            writes: Mutex::new(()),
        }
    }

    /// Serialize a persist-then-cache sequence
    pub async fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().await
    }

    /// Get account by id
    pub async fn get(&self, id: i64) -> Option<Arc<Account>> {
        let result = self.accounts.get(&id).await;

        use crate::metrics::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};
        if result.is_some() {
            CACHE_HITS_TOTAL.with_label_values(&["account"]).inc();
        } else {
            CACHE_MISSES_TOTAL.with_label_values(&["account"]).inc();
        }

        result
    }

    /// Insert or replace an account
    pub async fn insert(&self, account: Account) -> Arc<Account> {
        let account = Arc::new(account);
        self.accounts.insert(account.id, account.clone()).await;

        use crate::metrics::CACHE_SIZE;
        CACHE_SIZE
            .with_label_values(&["account"])
            .set(self.accounts.entry_count() as i64);

        account
    }
}
