use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, error};

use crate::clock::{self, Clock};
use crate::storage::{keys, CreateOutcome, Storage};
use crate::visitor::Fingerprint;

/// Default dedup window: 30 minutes
pub const DEFAULT_COOLDOWN_SECS: u64 = 1800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// First request in the window; the visit counts
    Acquired,
    /// A live lock exists for this fingerprint
    CooldownActive,
    /// The store failed; the visit is not counted
    StoreError,
}

/// Per-fingerprint cooldown enforced with the store's conditional create.
///
/// Locks are never deleted here; the store expires them.
pub struct DedupLock {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
}

impl DedupLock {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, cooldown_secs: u64) -> Self {
        Self {
            storage,
            clock,
            cooldown: clock::window(cooldown_secs),
        }
    }

    pub async fn acquire(&self, fingerprint: &Fingerprint) -> LockOutcome {
        let key = keys::lock_key(fingerprint.as_str());
        let now = self.clock.now();

        match self.storage.conditional_create(&key, now, self.cooldown).await {
            Ok(CreateOutcome::Created) => LockOutcome::Acquired,
            Ok(CreateOutcome::AlreadyExists) => {
                debug!(visitor = %fingerprint.short(), "cooldown active");
                LockOutcome::CooldownActive
            }
            Err(e) => {
                error!(visitor = %fingerprint.short(), error = %e, "failed to write visitor lock");
                LockOutcome::StoreError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStorage;

    fn lock_with_clock() -> (DedupLock, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let lock = DedupLock::new(
            Arc::new(MemoryStorage::new()),
            clock.clone(),
            DEFAULT_COOLDOWN_SECS,
        );
        (lock, clock)
    }

    #[tokio::test]
    async fn test_second_acquire_within_window_is_rejected() {
        let (lock, clock) = lock_with_clock();
        let fp = Fingerprint::derive("1.2.3.4", "UA1");

        assert_eq!(lock.acquire(&fp).await, LockOutcome::Acquired);
        clock.advance(Duration::seconds(60));
        assert_eq!(lock.acquire(&fp).await, LockOutcome::CooldownActive);
    }

    #[tokio::test]
    async fn test_acquire_succeeds_after_cooldown() {
        let (lock, clock) = lock_with_clock();
        let fp = Fingerprint::derive("1.2.3.4", "UA1");

        lock.acquire(&fp).await;
        clock.advance(Duration::seconds(DEFAULT_COOLDOWN_SECS as i64));
        assert_eq!(lock.acquire(&fp).await, LockOutcome::Acquired);
    }

    #[tokio::test]
    async fn test_distinct_fingerprints_lock_independently() {
        let (lock, _clock) = lock_with_clock();

        assert_eq!(lock.acquire(&Fingerprint::derive("a", "UA")).await, LockOutcome::Acquired);
        assert_eq!(lock.acquire(&Fingerprint::derive("b", "UA")).await, LockOutcome::Acquired);
    }

    #[tokio::test]
    async fn test_oversized_cooldown_still_dedups() {
        let clock = Arc::new(ManualClock::starting_now());
        let lock = DedupLock::new(Arc::new(MemoryStorage::new()), clock, u64::MAX);
        let fp = Fingerprint::derive("1.2.3.4", "UA1");

        assert_eq!(lock.acquire(&fp).await, LockOutcome::Acquired);
        assert_eq!(lock.acquire(&fp).await, LockOutcome::CooldownActive);
    }
}
