use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::storage::{keys, Storage};
use crate::visitor::VisitorMetadata;

/// One counted axis of a visit, e.g. country `US`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    /// Key prefix naming the dimension (`COUNTRY#`, `DEVICE#`, ...)
    pub prefix: &'static str,
    pub value: String,
}

impl Dimension {
    pub fn new(prefix: &'static str, value: impl Into<String>) -> Self {
        Self {
            prefix,
            value: value.into(),
        }
    }

    pub fn key(&self) -> String {
        keys::dimension_key(self.prefix, &self.value)
    }
}

/// The dimensions a visit is counted under, besides the total
pub fn visit_dimensions(visitor: &VisitorMetadata) -> Vec<Dimension> {
    vec![
        Dimension::new(keys::COUNTRY_PREFIX, visitor.country.as_str()),
        Dimension::new(keys::DEVICE_PREFIX, visitor.device.as_str()),
    ]
}

#[derive(Debug, Error)]
#[error("failed to update counters: {}", .failed.join(", "))]
pub struct MetricsError {
    pub failed: Vec<String>,
}

/// Atomic counter updates for a counted visit.
///
/// Each counter is a separate store operation. A failure on one does not
/// stop the others and nothing is rolled back.
pub struct MetricsRecorder {
    storage: Arc<dyn Storage>,
}

impl MetricsRecorder {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn record(&self, dimensions: &[Dimension]) -> Result<(), MetricsError> {
        let counters = std::iter::once(keys::TOTAL_VISITS_KEY.to_string())
            .chain(dimensions.iter().map(Dimension::key));

        let mut failed = Vec::new();
        for key in counters {
            if let Err(e) = self.storage.increment(&key, keys::METRIC_KIND, 1).await {
                error!(counter = %key, error = %e, "failed to increment counter");
                failed.push(key);
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(MetricsError { failed })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::visitor::DeviceClass;

    #[tokio::test]
    async fn test_record_increments_total_and_dimensions() {
        let storage = Arc::new(MemoryStorage::new());
        let recorder = MetricsRecorder::new(storage.clone());

        let visitor = VisitorMetadata {
            client_address: "1.2.3.4".to_string(),
            user_agent: "UA1".to_string(),
            country: "US".to_string(),
            device: DeviceClass::Desktop,
        };

        recorder.record(&visit_dimensions(&visitor)).await.unwrap();
        recorder.record(&visit_dimensions(&visitor)).await.unwrap();

        assert_eq!(storage.count("TOTAL_VISITS"), Some(2));
        assert_eq!(storage.count("COUNTRY#US"), Some(2));
        assert_eq!(storage.count("DEVICE#Desktop"), Some(2));
    }

    #[tokio::test]
    async fn test_extra_dimension_needs_no_orchestration_change() {
        let storage = Arc::new(MemoryStorage::new());
        let recorder = MetricsRecorder::new(storage.clone());

        recorder
            .record(&[Dimension::new("BROWSER#", "Firefox")])
            .await
            .unwrap();

        assert_eq!(storage.count("TOTAL_VISITS"), Some(1));
        assert_eq!(storage.count("BROWSER#Firefox"), Some(1));
    }
}
