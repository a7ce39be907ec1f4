//! Tile Store Module
//!
//! Capacity-bounded store for raw map tile images. Tiles never expire; when
//! the store overflows it is flushed wholesale rather than trimmed.

use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{CacheStats, StatsCounters, TILE_CAPACITY};

// == Tile Store ==
/// Map of `"z/x/y"` to PNG bytes with full-flush eviction.
#[derive(Debug)]
pub struct TileStore {
    tiles: RwLock<HashMap<String, Bytes>>,
    stats: StatsCounters,
    capacity: usize,
}

impl TileStore {
    // == Constructor ==
    /// Creates an empty store that flushes once it holds more than `capacity` tiles.
    pub fn new(capacity: usize) -> Self {
        Self {
            tiles: RwLock::new(HashMap::new()),
            stats: StatsCounters::new(),
            capacity,
        }
    }

    // == Get ==
    /// Reads a tile under the shared lock.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let tiles = self.tiles.read().await;
        match tiles.get(key) {
            Some(bytes) => {
                self.stats.record_hit();
                Some(bytes.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Inserts a tile under the exclusive lock.
    ///
    /// If the pre-insert count strictly exceeds the capacity every existing
    /// tile is discarded first, so the store peaks at `capacity + 1` entries.
    pub async fn put(&self, key: impl Into<String>, bytes: Bytes) {
        let mut tiles = self.tiles.write().await;

        if tiles.len() > self.capacity {
            let flushed = tiles.len();
            tiles.clear();
            self.stats.record_evictions(flushed as u64);
            info!("Tile cache over capacity, flushed {} tiles", flushed);
        }

        tiles.insert(key.into(), bytes);
    }

    pub async fn len(&self) -> usize {
        self.tiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tiles.read().await.is_empty()
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        let total = self.len().await;
        self.stats.snapshot(total)
    }
}

impl Default for TileStore {
    fn default() -> Self {
        Self::new(TILE_CAPACITY)
    }
}
