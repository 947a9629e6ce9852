pub mod keys;
pub mod memory;
pub mod postgres;
pub mod sqlite;
pub mod sweeper;
pub mod trait_def;

use anyhow::{bail, Result};
use std::sync::Arc;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;
pub use sqlite::SqliteStorage;
pub use sweeper::spawn_expiry_sweeper;
pub use trait_def::{CounterRecord, CreateOutcome, Storage, StorageError, StorageResult};

/// Open the backend named by the scheme of `url`
pub async fn connect(url: &str, max_connections: u32) -> Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = if url.starts_with("memory:") {
        Arc::new(MemoryStorage::new())
    } else if url.starts_with("sqlite:") {
        Arc::new(SqliteStorage::new(url, max_connections).await?)
    } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        Arc::new(PostgresStorage::new(url, max_connections).await?)
    } else {
        let scheme = url.split(':').next().unwrap_or_default();
        bail!("unsupported store scheme '{scheme}': expected memory:, sqlite: or postgres://");
    };

    Ok(storage)
}
