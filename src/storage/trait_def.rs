use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Result of a conditional create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// No live record held the key; ours is now in place
    Created,
    /// A record with the key exists and has not expired
    AlreadyExists,
}

/// A counter as returned by the kind lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterRecord {
    pub key: String,
    pub count: u64,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables, indexes, etc.)
    async fn init(&self) -> Result<()>;

    /// Create `key` with an expiry of `now + ttl`, atomically.
    ///
    /// Fails with [`CreateOutcome::AlreadyExists`] when a record with the same
    /// key exists and its expiry is still in the future. A record whose expiry
    /// has passed is treated as absent and replaced.
    async fn conditional_create(
        &self,
        key: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> StorageResult<CreateOutcome>;

    /// Add `by` to the counter at `key`, creating it at zero first if absent,
    /// and tag it with `kind`. Returns the new value.
    async fn increment(&self, key: &str, kind: &str, by: u64) -> StorageResult<u64>;

    /// Every record tagged with `kind`
    async fn query_by_kind(&self, kind: &str) -> StorageResult<Vec<CounterRecord>>;

    /// Remove records whose expiry is at or before `now`. Returns how many went.
    async fn purge_expired(&self, now: DateTime<Utc>) -> StorageResult<u64>;
}
