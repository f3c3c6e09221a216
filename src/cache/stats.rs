//! Cache Statistics Module
//!
//! Tracks cache lookups and how misses were resolved.

use serde::Serialize;

use crate::cache::Source;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of fresh cache retrievals
    pub hits: u64,
    /// Number of lookups that found nothing fresh
    pub misses: u64,
    /// Misses resolved by the upstream API
    pub primary_successes: u64,
    /// Misses resolved by synthetic data
    pub fallbacks: u64,
    /// Calls that waited on another caller's in-flight fetch
    pub coalesced: u64,
    /// Entries removed by the stale sweep
    pub swept: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Fallback Rate ==
    /// Share of resolved misses that had to use synthetic data.
    pub fn fallback_rate(&self) -> f64 {
        let total = self.primary_successes + self.fallbacks;
        if total == 0 {
            0.0
        } else {
            self.fallbacks as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Resolution ==
    /// Counts a stored value by its producer.
    pub fn record_resolution(&mut self, source: Source) {
        match source {
            Source::Primary => self.primary_successes += 1,
            Source::Fallback => self.fallbacks += 1,
            Source::Cache => {}
        }
    }

    pub fn record_coalesced(&mut self) {
        self.coalesced += 1;
    }

    pub fn record_swept(&mut self, count: usize) {
        self.swept += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.fallbacks, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_record_resolution_by_source() {
        let mut stats = CacheStats::new();
        stats.record_resolution(Source::Primary);
        stats.record_resolution(Source::Fallback);
        stats.record_resolution(Source::Fallback);
        stats.record_resolution(Source::Cache);

        assert_eq!(stats.primary_successes, 1);
        assert_eq!(stats.fallbacks, 2);
        assert!((stats.fallback_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_swept_accumulates() {
        let mut stats = CacheStats::new();
        stats.record_swept(3);
        stats.record_swept(2);
        assert_eq!(stats.swept, 5);
    }
}
