//! Time source shared by the dedup lock, the stats cache and the handler.
//!
//! Production code uses [`SystemClock`]; tests drive [`ManualClock`] to move
//! past cooldown windows and cache TTLs without sleeping.

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;

/// Longest cooldown or cache lifetime accepted: ten years
pub const MAX_WINDOW_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// A configured window in seconds as a `Duration`, capped at [`MAX_WINDOW_SECS`]
/// so `now + window` cannot overflow.
pub fn window(secs: u64) -> Duration {
    let capped = secs.min(MAX_WINDOW_SECS) as i64;
    Duration::try_seconds(capped).unwrap_or_else(|| Duration::days(3650))
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time from the host
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Start at the current wall-clock instant
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(11));
        assert_eq!(clock.now(), start + Duration::seconds(11));
    }

    #[test]
    fn test_window_is_capped() {
        assert_eq!(window(1800), Duration::seconds(1800));
        assert_eq!(window(u64::MAX), Duration::seconds(MAX_WINDOW_SECS as i64));

        // Capped windows stay addable to the current instant
        let _ = Utc::now() + window(u64::MAX);
    }
}
