//! Cache-Aside Resolver
//!
//! Check the store, fetch upstream on a miss, populate, return. Failed
//! fetches are returned as-is and never written to the store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, TileStore, TtlStore};
use crate::upstream::{Fetch, UpstreamError};

// == Backing Trait ==
/// Storage side of a cache-aside lookup.
#[async_trait]
pub trait Backing<V>: Send + Sync {
    /// Returns a usable payload, or `None` when the caller must fetch.
    async fn lookup(&self, key: &str) -> Option<V>;

    /// Stores a freshly fetched payload.
    async fn populate(&self, key: &str, value: V);

    async fn stats(&self) -> CacheStats;
}

// == TTL Backing ==
/// A shared [`TtlStore`] paired with the TTL this resource kind writes with.
pub struct WithTtl<V> {
    store: Arc<TtlStore<V>>,
    ttl: Duration,
}

impl<V> WithTtl<V> {
    pub fn new(store: Arc<TtlStore<V>>, ttl: Duration) -> Self {
        Self { store, ttl }
    }
}

#[async_trait]
impl<V> Backing<V> for WithTtl<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn lookup(&self, key: &str) -> Option<V> {
        self.store.get(key).await.fresh()
    }

    async fn populate(&self, key: &str, value: V) {
        self.store.put(key, value, self.ttl).await;
    }

    async fn stats(&self) -> CacheStats {
        self.store.stats().await
    }
}

#[async_trait]
impl Backing<Bytes> for TileStore {
    async fn lookup(&self, key: &str) -> Option<Bytes> {
        self.get(key).await
    }

    async fn populate(&self, key: &str, value: Bytes) {
        self.put(key, value).await;
    }

    async fn stats(&self) -> CacheStats {
        TileStore::stats(self).await
    }
}

// == Cache Aside ==
/// Fronts one upstream provider with one store.
///
/// No single-flight: concurrent misses on the same key each fetch, and the
/// last writer wins.
pub struct CacheAside<V> {
    label: &'static str,
    backing: Arc<dyn Backing<V>>,
    upstream: Arc<dyn Fetch<Output = V>>,
}

impl<V> CacheAside<V>
where
    V: Clone + Send + 'static,
{
    pub fn new(
        label: &'static str,
        backing: Arc<dyn Backing<V>>,
        upstream: Arc<dyn Fetch<Output = V>>,
    ) -> Self {
        Self {
            label,
            backing,
            upstream,
        }
    }

    // == Resolve ==
    /// Returns the cached payload for `key`, fetching and caching it on a miss.
    ///
    /// No lock is held while the upstream call is in flight.
    pub async fn resolve(&self, key: &str) -> Result<V, UpstreamError> {
        if let Some(value) = self.backing.lookup(key).await {
            debug!("[{}] cache hit: {}", self.label, key);
            return Ok(value);
        }

        info!("[{}] cache miss, fetching upstream: {}", self.label, key);
        let value = match self.upstream.fetch(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!("[{}] upstream fetch failed for {}: {}", self.label, key, err);
                return Err(err);
            }
        };

        self.backing.populate(key, value.clone()).await;
        Ok(value)
    }

    pub async fn stats(&self) -> CacheStats {
        self.backing.stats().await
    }
}
