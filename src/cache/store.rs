//! TTL Store Module
//!
//! Keyed store where every entry carries its own expiration instant.
//! Expiry is lazy: stale entries stay in the map until overwritten.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::cache::{CacheEntry, CacheStats, Clock, StatsCounters, SystemClock};

// == Lookup ==
/// Result of reading a key from a [`TtlStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Present and `now < expires_at`
    Fresh(T),
    /// Present but past its expiration instant
    Stale(T),
    /// Never written
    Missing,
}

impl<T> Lookup<T> {
    /// Returns the payload only when it is still valid.
    pub fn fresh(self) -> Option<T> {
        match self {
            Lookup::Fresh(payload) => Some(payload),
            Lookup::Stale(_) | Lookup::Missing => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Lookup::Fresh(_))
    }
}

// == TTL Store ==
/// Unbounded map of key to TTL-stamped payload behind one reader/writer lock.
pub struct TtlStore<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    stats: StatsCounters,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TtlStore<T> {
    // == Constructor ==
    /// Creates an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store reading time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: StatsCounters::new(),
            clock,
        }
    }

    // == Get ==
    /// Reads `key` under the shared lock.
    ///
    /// A stale entry is reported as such but left in place.
    pub async fn get(&self, key: &str) -> Lookup<T> {
        let now = self.clock.now();
        let entries = self.entries.read().await;

        match entries.get(key) {
            Some(entry) if entry.is_valid_at(now) => {
                self.stats.record_hit();
                Lookup::Fresh(entry.payload.clone())
            }
            Some(entry) => {
                self.stats.record_miss();
                Lookup::Stale(entry.payload.clone())
            }
            None => {
                self.stats.record_miss();
                Lookup::Missing
            }
        }
    }

    // == Put ==
    /// Stores `payload` under `key` for `ttl`, replacing any prior entry.
    pub async fn put(&self, key: impl Into<String>, payload: T, ttl: Duration) {
        let entry = CacheEntry::new(payload, self.clock.now(), ttl);
        self.entries.write().await.insert(key.into(), entry);
    }

    // == Length ==
    /// Number of entries physically present, stale ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        let total = self.len().await;
        self.stats.snapshot(total)
    }
}

impl<T: Clone> Default for TtlStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
