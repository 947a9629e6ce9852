//! Store traffic generated by the stats cache

mod common;

use chrono::Duration;
use common::{FlakyStorage, CACHE_TTL_SECS};
use std::sync::Arc;
use visitor_counter::clock::ManualClock;
use visitor_counter::storage::{keys, Storage};
use visitor_counter::visits::StatsCache;

fn cache_over(storage: &Arc<FlakyStorage>) -> (StatsCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_now());
    let cache = StatsCache::new(storage.clone(), clock.clone(), CACHE_TTL_SECS);
    (cache, clock)
}

#[tokio::test]
async fn test_two_gets_within_ttl_issue_one_query() {
    let storage = Arc::new(FlakyStorage::new());
    storage
        .increment(keys::TOTAL_VISITS_KEY, keys::METRIC_KIND, 3)
        .await
        .unwrap();
    let (cache, clock) = cache_over(&storage);

    let first = cache.get().await;
    assert_eq!(storage.query_count(), 1);

    clock.advance(Duration::seconds(CACHE_TTL_SECS as i64 - 1));
    let second = cache.get().await;
    assert_eq!(storage.query_count(), 1, "Second get must not touch the store");
    assert_eq!(*first.snapshot, *second.snapshot);
    assert_eq!(second.snapshot.total_visits, 3);
}

#[tokio::test]
async fn test_expired_snapshot_triggers_exactly_one_query() {
    let storage = Arc::new(FlakyStorage::new());
    let (cache, clock) = cache_over(&storage);

    cache.get().await;
    clock.advance(Duration::seconds(CACHE_TTL_SECS as i64));

    let refreshed = cache.get().await;
    assert!(!refreshed.cache_hit);
    assert_eq!(storage.query_count(), 2);

    cache.get().await;
    assert_eq!(storage.query_count(), 2);
}

#[tokio::test]
async fn test_failed_refill_degrades_then_recovers() {
    let storage = Arc::new(FlakyStorage::new());
    storage
        .increment(keys::TOTAL_VISITS_KEY, keys::METRIC_KIND, 5)
        .await
        .unwrap();
    let (cache, clock) = cache_over(&storage);

    storage.fail_queries(true);
    let degraded = cache.get().await;
    assert_eq!(degraded.snapshot.total_visits, 0);
    assert!(degraded.snapshot.countries.is_empty());

    storage.fail_queries(false);
    clock.advance(Duration::seconds(CACHE_TTL_SECS as i64));
    let recovered = cache.get().await;
    assert_eq!(recovered.snapshot.total_visits, 5);
}
