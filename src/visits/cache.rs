//! Process-local cache of aggregate statistics
//!
//! Cache-aside with a fixed TTL: a fresh snapshot is served without touching
//! the store, a stale or missing one triggers a single kind lookup and is
//! replaced wholesale. Snapshot and expiry are swapped together under a
//! short write lock, so readers always see a matching pair.
//!
//! There is no single-flight guard. Concurrent misses in one process may each
//! query the store; the TTL bounds how often that can happen.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::clock::{self, Clock};
use crate::storage::{keys, CounterRecord, Storage};

/// Default snapshot lifetime
pub const DEFAULT_CACHE_TTL_SECS: u64 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_visits: u64,
    pub countries: BTreeMap<String, u64>,
    pub devices: BTreeMap<String, u64>,
}

impl StatsSnapshot {
    /// Fold counter records into a snapshot by key prefix.
    ///
    /// Records whose key matches no known counter are skipped.
    pub fn from_records(records: impl IntoIterator<Item = CounterRecord>) -> Self {
        let mut snapshot = Self::default();

        for record in records {
            if record.key == keys::TOTAL_VISITS_KEY {
                snapshot.total_visits = record.count;
            } else if let Some(country) = record.key.strip_prefix(keys::COUNTRY_PREFIX) {
                snapshot.countries.insert(country.to_string(), record.count);
            } else if let Some(device) = record.key.strip_prefix(keys::DEVICE_PREFIX) {
                snapshot.devices.insert(device.to_string(), record.count);
            }
        }

        snapshot
    }
}

struct CachedStats {
    snapshot: Arc<StatsSnapshot>,
    expires_at: DateTime<Utc>,
}

/// A snapshot plus whether it came from memory
#[derive(Debug, Clone)]
pub struct StatsLookup {
    pub snapshot: Arc<StatsSnapshot>,
    pub cache_hit: bool,
}

pub struct StatsCache {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    current: RwLock<Option<Arc<CachedStats>>>,
}

impl StatsCache {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, ttl_secs: u64) -> Self {
        Self {
            storage,
            clock,
            ttl: clock::window(ttl_secs),
            current: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> StatsLookup {
        let now = self.clock.now();

        let cached = self.current.read().await.clone();
        if let Some(cached) = cached {
            if now < cached.expires_at {
                debug!("stats cache hit");
                return StatsLookup {
                    snapshot: Arc::clone(&cached.snapshot),
                    cache_hit: true,
                };
            }
        }

        debug!("stats cache miss, querying store");
        let snapshot = Arc::new(self.load().await);

        *self.current.write().await = Some(Arc::new(CachedStats {
            snapshot: Arc::clone(&snapshot),
            expires_at: now + self.ttl,
        }));

        StatsLookup {
            snapshot,
            cache_hit: false,
        }
    }

    /// Read straight from the store; a failed lookup yields zeroes
    async fn load(&self) -> StatsSnapshot {
        match self.storage.query_by_kind(keys::METRIC_KIND).await {
            Ok(records) => StatsSnapshot::from_records(records),
            Err(e) => {
                error!(error = %e, "failed to fetch stats, serving empty snapshot");
                StatsSnapshot::default()
            }
        }
    }
}
