//! Visit counting: deduplication, counter updates and cached statistics

pub mod cache;
pub mod counter;
pub mod dedup;
pub mod metrics;

pub use cache::{StatsCache, StatsLookup, StatsSnapshot};
pub use counter::{VisitCounter, VisitReport, VisitStatus};
pub use dedup::{DedupLock, LockOutcome};
pub use metrics::{Dimension, MetricsError, MetricsRecorder};
