//! Cache Module
//!
//! In-memory stores with lazy TTL expiry and capacity-bounded tile storage,
//! plus the cache-aside resolver that fronts upstream providers with them.

mod clock;
mod entry;
mod resolver;
mod stats;
mod store;
mod tile;

#[cfg(test)]
mod property_tests;

use std::time::Duration;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use resolver::{Backing, CacheAside, WithTtl};
pub use stats::{CacheStats, StatsCounters};
pub use store::{Lookup, TtlStore};
pub use tile::TileStore;

// == Public Constants ==
/// Lifetime of a cached news article list
pub const NEWS_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Lifetime of a cached place search result
pub const SEARCH_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Lifetime of the identity provider's cached signing keys
pub const SIGNING_KEYS_TTL: Duration = Duration::from_secs(60 * 60);

/// Tile count above which the tile store is flushed on the next insert
pub const TILE_CAPACITY: usize = 2000;
