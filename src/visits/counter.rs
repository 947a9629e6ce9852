use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::cache::{StatsCache, StatsSnapshot};
use super::dedup::{DedupLock, LockOutcome};
use super::metrics::{visit_dimensions, MetricsRecorder};
use crate::clock::Clock;
use crate::storage::Storage;
use crate::visitor::{DeviceClass, VisitorMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VisitStatus {
    #[serde(rename = "New visit counted")]
    Counted,
    #[serde(rename = "Reload ignored (Cooldown active)")]
    Ignored,
    #[serde(rename = "Error updating metrics")]
    MetricsError,
}

/// Everything the response needs about one handled visit
#[derive(Debug, Clone)]
pub struct VisitReport {
    pub status: VisitStatus,
    pub country: String,
    pub device: DeviceClass,
    pub stats: Arc<StatsSnapshot>,
    pub cache_hit: bool,
}

/// Runs a visit through dedup, counting and stats retrieval in order.
///
/// Store failures at any step degrade the report; they never fail it.
pub struct VisitCounter {
    dedup: DedupLock,
    metrics: MetricsRecorder,
    cache: StatsCache,
}

impl VisitCounter {
    pub fn new(dedup: DedupLock, metrics: MetricsRecorder, cache: StatsCache) -> Self {
        Self {
            dedup,
            metrics,
            cache,
        }
    }

    /// Wire the three stages to one store and clock
    pub fn with_storage(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        cooldown_secs: u64,
        cache_ttl_secs: u64,
    ) -> Self {
        Self::new(
            DedupLock::new(Arc::clone(&storage), Arc::clone(&clock), cooldown_secs),
            MetricsRecorder::new(Arc::clone(&storage)),
            StatsCache::new(storage, clock, cache_ttl_secs),
        )
    }

    pub async fn record_visit(&self, visitor: &VisitorMetadata) -> VisitReport {
        let fingerprint = visitor.fingerprint();

        let status = match self.dedup.acquire(&fingerprint).await {
            LockOutcome::Acquired => match self.metrics.record(&visit_dimensions(visitor)).await {
                Ok(()) => {
                    info!(
                        visitor = %fingerprint.short(),
                        country = %visitor.country,
                        device = %visitor.device,
                        "new visit counted"
                    );
                    VisitStatus::Counted
                }
                Err(e) => {
                    warn!(visitor = %fingerprint.short(), error = %e, "visit only partly counted");
                    VisitStatus::MetricsError
                }
            },
            LockOutcome::CooldownActive | LockOutcome::StoreError => VisitStatus::Ignored,
        };

        let stats = self.cache.get().await;

        VisitReport {
            status,
            country: visitor.country.clone(),
            device: visitor.device,
            stats: stats.snapshot,
            cache_hit: stats.cache_hit,
        }
    }
}
