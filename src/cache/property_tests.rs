//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store and resolver guarantees over generated
//! keys, payloads and timelines.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_test::block_on;

use crate::cache::{CacheAside, Lookup, ManualClock, TileStore, TtlStore, WithTtl};
use crate::upstream::{Fetch, UpstreamError};

// == Strategies ==
/// Generates cache keys shaped like categories, queries or tile coordinates
fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,12}",
        "[a-z ]{1,24}",
        (0u32..20, 0u32..1000, 0u32..1000).prop_map(|(z, x, y)| format!("{z}/{x}/{y}")),
    ]
}

fn payload_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,64}"
}

/// TTLs between one second and one day
fn ttl_strategy() -> impl Strategy<Value = u64> {
    1u64..86_400
}

#[derive(Debug, Clone)]
enum TileOp {
    Put(String),
    Get(String),
}

fn tile_op_strategy() -> impl Strategy<Value = TileOp> {
    prop_oneof![
        key_strategy().prop_map(TileOp::Put),
        key_strategy().prop_map(TileOp::Get),
    ]
}

/// Upstream that echoes the key and counts calls.
struct Echo {
    calls: AtomicUsize,
}

#[async_trait]
impl Fetch for Echo {
    type Output = String;

    async fn fetch(&self, key: &str) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(key.to_uppercase())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // A get immediately after a put returns that payload as fresh.
    #[test]
    fn prop_get_after_put_is_fresh(
        key in key_strategy(),
        payload in payload_strategy(),
        ttl in ttl_strategy(),
    ) {
        block_on(async {
            let store = TtlStore::new();
            store.put(key.clone(), payload.clone(), Duration::from_secs(ttl)).await;
            prop_assert_eq!(store.get(&key).await, Lookup::Fresh(payload));
            Ok(())
        })?;
    }

    // An entry is fresh strictly before its expiry instant and stale from it on,
    // and stale entries are never removed by reads.
    #[test]
    fn prop_lazy_expiry(
        key in key_strategy(),
        payload in payload_strategy(),
        ttl in ttl_strategy(),
        elapsed in 0u64..172_800,
    ) {
        block_on(async {
            let clock = Arc::new(ManualClock::default());
            let store = TtlStore::with_clock(clock.clone());
            store.put(key.clone(), payload.clone(), Duration::from_secs(ttl)).await;

            clock.advance(chrono::Duration::seconds(elapsed as i64));
            let lookup = store.get(&key).await;

            if elapsed < ttl {
                prop_assert_eq!(lookup, Lookup::Fresh(payload));
            } else {
                prop_assert_eq!(lookup, Lookup::Stale(payload));
            }
            prop_assert_eq!(store.len().await, 1);
            Ok(())
        })?;
    }

    // Overwriting a key replaces the payload and restarts its TTL.
    #[test]
    fn prop_overwrite_replaces(
        key in key_strategy(),
        first in payload_strategy(),
        second in payload_strategy(),
        ttl in 2u64..86_400,
    ) {
        block_on(async {
            let clock = Arc::new(ManualClock::default());
            let store = TtlStore::with_clock(clock.clone());
            let ttl = Duration::from_secs(ttl);

            store.put(key.clone(), first, ttl).await;
            clock.advance(chrono::Duration::seconds(ttl.as_secs() as i64 - 1));
            store.put(key.clone(), second.clone(), ttl).await;
            clock.advance(chrono::Duration::seconds(1));

            prop_assert_eq!(store.get(&key).await, Lookup::Fresh(second));
            prop_assert_eq!(store.len().await, 1);
            Ok(())
        })?;
    }

    // The tile store never holds more than capacity + 1 tiles, and a flush
    // happens exactly when an insert finds more than capacity tiles present.
    #[test]
    fn prop_tile_store_bounded(
        capacity in 1usize..16,
        ops in prop::collection::vec(tile_op_strategy(), 1..120),
    ) {
        block_on(async {
            let store = TileStore::new(capacity);
            let mut model: HashSet<String> = HashSet::new();
            let mut flushed: u64 = 0;

            for op in ops {
                match op {
                    TileOp::Put(key) => {
                        if model.len() > capacity {
                            flushed += model.len() as u64;
                            model.clear();
                        }
                        model.insert(key.clone());
                        store.put(key, Bytes::from_static(b"png")).await;
                    }
                    TileOp::Get(key) => {
                        prop_assert_eq!(store.get(&key).await.is_some(), model.contains(&key));
                    }
                }
                prop_assert!(store.len().await <= capacity + 1);
            }

            let stats = store.stats().await;
            prop_assert_eq!(stats.total_entries, model.len());
            prop_assert_eq!(stats.evictions, flushed);
            Ok(())
        })?;
    }

    // Within the TTL, any number of resolves of the same key fetch once.
    #[test]
    fn prop_resolve_idempotent_within_ttl(
        keys in prop::collection::vec("[a-z]{1,6}", 1..20),
    ) {
        block_on(async {
            let store: Arc<TtlStore<String>> = Arc::new(TtlStore::new());
            let upstream = Arc::new(Echo { calls: AtomicUsize::new(0) });
            let resolver = CacheAside::<String>::new(
                "prop",
                Arc::new(WithTtl::new(store, Duration::from_secs(3600))),
                upstream.clone(),
            );

            for key in &keys {
                prop_assert_eq!(resolver.resolve(key).await.unwrap(), key.to_uppercase());
            }

            let distinct: HashSet<&String> = keys.iter().collect();
            prop_assert_eq!(upstream.calls.load(Ordering::SeqCst), distinct.len());
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn test_tile_flush_on_2002nd_distinct_key() {
    let store = TileStore::default();

    for i in 0..2001 {
        store.put(format!("12/{i}/0"), Bytes::from_static(b"png")).await;
    }
    assert_eq!(store.len().await, 2001);

    store.put("12/9999/0", Bytes::from_static(b"png")).await;
    assert_eq!(store.len().await, 1);
    assert_eq!(store.get("12/9999/0").await, Some(Bytes::from_static(b"png")));
    assert_eq!(store.stats().await.evictions, 2001);
}
