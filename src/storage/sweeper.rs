use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;

use crate::clock::Clock;
use crate::storage::Storage;

/// Periodically delete expired lock records.
///
/// Stands in for the automatic record expiry a managed store provides.
/// Counting never depends on it: conditional create already treats an
/// expired lock as absent.
pub fn spawn_expiry_sweeper(
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(interval_secs));
        // Skip the first tick which fires immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            match storage.purge_expired(clock.now()).await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!("Purged {} expired visitor locks", removed),
                Err(e) => tracing::error!("Failed to purge expired visitor locks: {}", e),
            }
        }
    })
}
