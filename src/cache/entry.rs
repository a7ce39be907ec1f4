//! Cache Entry Module
//!
//! Defines a single TTL-stamped cache entry.

use std::time::Duration;

use chrono::{DateTime, Utc};

// == Cache Entry ==
/// A stored payload together with the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The cached payload
    pub payload: T,
    /// Expiration instant, always `written_at + ttl`
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry written at `now` that lives for `ttl`.
    ///
    /// A TTL too large to represent saturates to the latest representable
    /// instant instead of wrapping.
    pub fn new(payload: T, now: DateTime<Utc>, ttl: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            payload,
            expires_at,
        }
    }

    // == Is Valid ==
    /// An entry is valid strictly before its expiration instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expires_at_now_plus_ttl() {
        let now = Utc::now();
        let entry = CacheEntry::new("payload", now, Duration::from_secs(60));

        assert_eq!(entry.expires_at - now, chrono::Duration::seconds(60));
        assert!(entry.is_valid_at(now));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Utc::now();
        let entry = CacheEntry::new("payload", now, Duration::from_secs(10));

        // Valid one millisecond before, invalid exactly at expires_at
        assert!(entry.is_valid_at(entry.expires_at - chrono::Duration::milliseconds(1)));
        assert!(!entry.is_valid_at(entry.expires_at));
    }

    #[test]
    fn test_zero_ttl_is_never_valid() {
        let now = Utc::now();
        let entry = CacheEntry::new("payload", now, Duration::ZERO);

        assert!(!entry.is_valid_at(now));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let now = Utc::now();
        let entry = CacheEntry::new("payload", now, Duration::MAX);

        assert_eq!(entry.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(entry.is_valid_at(now));
    }
}
