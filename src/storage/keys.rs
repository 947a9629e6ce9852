//! Record key layout shared by every backend.
//!
//! Locks and counters live in the same keyspace, told apart by prefix.
//! Only counters carry the [`METRIC_KIND`] tag, so the kind lookup never
//! returns lock records.

pub const METRIC_KIND: &str = "METRIC";
pub const TOTAL_VISITS_KEY: &str = "TOTAL_VISITS";

pub const LOCK_PREFIX: &str = "LOCK#";
pub const COUNTRY_PREFIX: &str = "COUNTRY#";
pub const DEVICE_PREFIX: &str = "DEVICE#";

pub fn lock_key(fingerprint: &str) -> String {
    format!("{LOCK_PREFIX}{fingerprint}")
}

/// Key for a counter along a named dimension, e.g. `COUNTRY#US`
pub fn dimension_key(prefix: &str, value: &str) -> String {
    format!("{prefix}{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(lock_key("abc"), "LOCK#abc");
        assert_eq!(dimension_key(COUNTRY_PREFIX, "US"), "COUNTRY#US");
        assert_eq!(dimension_key(DEVICE_PREFIX, "Mobile"), "DEVICE#Mobile");
    }
}
