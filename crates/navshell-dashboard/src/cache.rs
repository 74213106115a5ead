#![forbid(unsafe_code)]

//! Time-boxed cache of the last subscription snapshot.
//!
//! Times are [`Clock`](navshell_runtime::Clock) offsets, never wall-clock.

use std::time::Duration;

use crate::billing::SubscriptionSnapshot;

/// How long a stored snapshot satisfies a non-forced refresh.
pub const FRESHNESS: Duration = Duration::from_millis(5000);

/// A stored snapshot and the time its fetch was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub snapshot: SubscriptionSnapshot,
    pub fetched_at: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    entry: Option<CacheEntry>,
    /// Fetches issued before this point are refused.
    floor: Duration,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }

    pub fn snapshot(&self) -> Option<&SubscriptionSnapshot> {
        self.entry.as_ref().map(|e| &e.snapshot)
    }

    /// Whether a snapshot exists and is younger than [`FRESHNESS`] at `now`.
    pub fn is_fresh_at(&self, now: Duration) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|e| now.saturating_sub(e.fetched_at) < FRESHNESS)
    }

    /// Replace the entry wholesale.
    ///
    /// A result from a fetch issued before the stored one, or before the
    /// last [`clear`](Self::clear), is dropped, so out-of-order completions
    /// never roll the cache back. Returns whether the entry was replaced.
    pub fn store(&mut self, snapshot: SubscriptionSnapshot, fetched_at: Duration) -> bool {
        let floor = self.entry.as_ref().map_or(self.floor, |e| e.fetched_at);
        if fetched_at < floor {
            return false;
        }
        self.entry = Some(CacheEntry {
            snapshot,
            fetched_at,
        });
        true
    }

    /// Drop the entry and refuse results from fetches issued before `at`.
    pub fn clear(&mut self, at: Duration) {
        self.entry = None;
        self.floor = self.floor.max(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn empty_cache_is_never_fresh() {
        assert!(!SnapshotCache::new().is_fresh_at(Duration::ZERO));
    }

    #[test]
    fn freshness_window_is_half_open() {
        let mut cache = SnapshotCache::new();
        cache.store(SubscriptionSnapshot::trial(3), ms(1_000));
        assert!(cache.is_fresh_at(ms(1_000)));
        assert!(cache.is_fresh_at(ms(5_999)));
        assert!(!cache.is_fresh_at(ms(6_000)));
    }

    #[test]
    fn store_replaces_wholesale() {
        let mut cache = SnapshotCache::new();
        cache.store(SubscriptionSnapshot::trial(3), ms(0));
        cache.store(SubscriptionSnapshot::default(), ms(10));
        assert_eq!(cache.snapshot(), Some(&SubscriptionSnapshot::default()));
        assert_eq!(cache.entry().map(|e| e.fetched_at), Some(ms(10)));
    }

    #[test]
    fn older_result_does_not_roll_back() {
        let mut cache = SnapshotCache::new();
        assert!(cache.store(SubscriptionSnapshot::trial(1), ms(500)));
        assert!(!cache.store(SubscriptionSnapshot::trial(9), ms(100)));
        assert_eq!(cache.snapshot().and_then(|s| s.days_remaining), Some(1));
    }

    #[test]
    fn clear_drops_entry_and_refuses_older_fetches() {
        let mut cache = SnapshotCache::new();
        cache.store(SubscriptionSnapshot::trial(1), ms(0));
        cache.clear(ms(800));
        assert!(cache.snapshot().is_none());
        assert!(!cache.is_fresh_at(ms(800)));

        assert!(!cache.store(SubscriptionSnapshot::trial(2), ms(500)));
        assert!(cache.snapshot().is_none());
        assert!(cache.store(SubscriptionSnapshot::trial(3), ms(800)));
        assert_eq!(cache.snapshot().and_then(|s| s.days_remaining), Some(3));
    }
}
