//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and their provenance.

use serde::Serialize;
use serde_json::Value;

// == Source ==
/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Served from a fresh cache entry
    Cache,
    /// Produced by the upstream API
    Primary,
    /// Synthesized after the upstream call failed
    Fallback,
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored payload
    pub value: Value,
    /// Storage timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Producer of the stored payload
    pub source: Source,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(value: Value, stored_at: u64, source: Source) -> Self {
        Self {
            value,
            stored_at,
            source,
        }
    }

    // == Age ==
    /// Milliseconds elapsed since the entry was stored.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.stored_at)
    }

    // == Is Fresh ==
    /// Checks whether the entry is still valid under `ttl_ms`.
    ///
    /// Boundary condition: the entry is fresh only while its age is strictly
    /// less than the TTL. A zero TTL therefore never yields a fresh entry.
    pub fn is_fresh(&self, now: u64, ttl_ms: u64) -> bool {
        self.age_ms(now) < ttl_ms
    }

    // == Time To Live ==
    /// Returns the remaining freshness in milliseconds, 0 once stale.
    pub fn ttl_remaining_ms(&self, now: u64, ttl_ms: u64) -> u64 {
        ttl_ms.saturating_sub(self.age_ms(now))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry_at(stored_at: u64) -> CacheEntry {
        CacheEntry::new(json!({"symbol": "AAPL"}), stored_at, Source::Primary)
    }

    #[test]
    fn test_entry_fresh_within_ttl() {
        let entry = entry_at(1_000);
        assert!(entry.is_fresh(1_000, 100));
        assert!(entry.is_fresh(1_099, 100));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = entry_at(1_000);
        // Age equal to the TTL is already stale
        assert!(!entry.is_fresh(1_100, 100));
        assert!(!entry.is_fresh(5_000, 100));
    }

    #[test]
    fn test_zero_ttl_is_never_fresh() {
        let entry = entry_at(1_000);
        assert!(!entry.is_fresh(1_000, 0));
    }

    #[test]
    fn test_clock_before_store_time() {
        let entry = entry_at(1_000);
        assert_eq!(entry.age_ms(900), 0);
        assert!(entry.is_fresh(900, 1));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = entry_at(1_000);
        assert_eq!(entry.ttl_remaining_ms(1_040, 100), 60);
        assert_eq!(entry.ttl_remaining_ms(2_000, 100), 0);
    }

    #[test]
    fn test_source_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Source::Fallback).unwrap(), "\"fallback\"");
        assert_eq!(serde_json::to_string(&Source::Cache).unwrap(), "\"cache\"");
    }
}
