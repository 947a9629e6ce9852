use crate::storage::{CounterRecord, CreateOutcome, Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                pk TEXT PRIMARY KEY,
                kind TEXT,
                count BIGINT NOT NULL DEFAULT 0,
                expires_at BIGINT
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_kind ON records(kind)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_expires_at ON records(expires_at)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn conditional_create(
        &self,
        key: &str,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> StorageResult<CreateOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO records (pk, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (pk) DO UPDATE
            SET expires_at = EXCLUDED.expires_at, kind = NULL, count = 0
            WHERE records.expires_at IS NOT NULL AND records.expires_at <= $3
            "#,
        )
        .bind(key)
        .bind((now + ttl).timestamp())
        .bind(now.timestamp())
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Ok(CreateOutcome::AlreadyExists);
        }

        Ok(CreateOutcome::Created)
    }

    async fn increment(&self, key: &str, kind: &str, by: u64) -> StorageResult<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO records (pk, kind, count)
            VALUES ($1, $2, $3)
            ON CONFLICT (pk) DO UPDATE
            SET count = records.count + EXCLUDED.count, kind = EXCLUDED.kind
            RETURNING count
            "#,
        )
        .bind(key)
        .bind(kind)
        .bind(by as i64)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(count.max(0) as u64)
    }

    async fn query_by_kind(&self, kind: &str) -> StorageResult<Vec<CounterRecord>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT pk, count
            FROM records
            WHERE kind = $1
            "#,
        )
        .bind(kind)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(rows
            .into_iter()
            .map(|(key, count)| CounterRecord {
                key,
                count: count.max(0) as u64,
            })
            .collect())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StorageResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM records
            WHERE expires_at IS NOT NULL AND expires_at <= $1
            "#,
        )
        .bind(now.timestamp())
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(result.rows_affected())
    }
}
