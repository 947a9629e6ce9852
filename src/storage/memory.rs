use crate::storage::{CounterRecord, CreateOutcome, Storage, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Debug, Clone, Default)]
struct Record {
    kind: Option<String>,
    count: u64,
    /// Unix timestamp (seconds) after which the record is logically gone
    expires_at: Option<i64>,
}

impl Record {
    fn is_live(&self, now: i64) -> bool {
        self.expires_at.map_or(true, |exp| exp > now)
    }
}

/// Process-local store backed by a sharded concurrent map.
///
/// Each operation holds the shard lock for the key it touches, which gives the
/// same per-key atomicity the SQL backends get from a single statement.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: DashMap<String, Record>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, live or not
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current value of the counter at `key`, if any
    pub fn count(&self, key: &str) -> Option<u64> {
        self.records.get(key).map(|r| r.count)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn conditional_create(
        &self,
        key: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> StorageResult<CreateOutcome> {
        let now_ts = now.timestamp();
        let expires_at = (now + ttl).timestamp();

        match self.records.entry(key.to_string()) {
            Entry::Occupied(entry) if entry.get().is_live(now_ts) => Ok(CreateOutcome::AlreadyExists),
            Entry::Occupied(mut entry) => {
                entry.insert(Record {
                    expires_at: Some(expires_at),
                    ..Record::default()
                });
                Ok(CreateOutcome::Created)
            }
            Entry::Vacant(entry) => {
                entry.insert(Record {
                    expires_at: Some(expires_at),
                    ..Record::default()
                });
                Ok(CreateOutcome::Created)
            }
        }
    }

    async fn increment(&self, key: &str, kind: &str, by: u64) -> StorageResult<u64> {
        let mut record = self.records.entry(key.to_string()).or_default();
        record.count = record.count.saturating_add(by);
        record.kind = Some(kind.to_string());
        Ok(record.count)
    }

    async fn query_by_kind(&self, kind: &str) -> StorageResult<Vec<CounterRecord>> {
        let records = self
            .records
            .iter()
            .filter(|entry| entry.value().kind.as_deref() == Some(kind))
            .map(|entry| CounterRecord {
                key: entry.key().clone(),
                count: entry.value().count,
            })
            .collect();

        Ok(records)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StorageResult<u64> {
        let now_ts = now.timestamp();
        let before = self.records.len();
        self.records.retain(|_, record| record.is_live(now_ts));
        Ok(before.saturating_sub(self.records.len()) as u64)
    }
}
