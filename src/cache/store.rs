//! Cache Store Module
//!
//! Main cache engine: keyed entries whose freshness is judged against the
//! category policy in force at read time.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::{CacheEntry, CacheKey, CacheStats, CategoryPolicy, Source};
use crate::clock::Clock;
use crate::error::{FeedError, Result};

// == Cache Store ==
/// Response cache with per-category TTLs.
///
/// There is no size bound; growth is limited only by [`CacheStore::sweep_stale`].
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage, one entry per key
    entries: HashMap<CacheKey, CacheEntry>,
    /// TTL table
    policy: CategoryPolicy,
    /// Performance statistics
    stats: CacheStats,
    /// Time source for store timestamps and staleness checks
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    // == Constructor ==
    pub fn new(policy: CategoryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            stats: CacheStats::new(),
            clock,
        }
    }

    // == Put ==
    /// Stores `value` under `key`, replacing any existing entry and
    /// stamping it with the current time.
    pub fn put(&mut self, key: CacheKey, value: Value, source: Source) {
        let entry = CacheEntry::new(value, self.clock.now_ms(), source);
        self.entries.insert(key, entry);
        self.stats.record_resolution(source);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Retrieves a value if an entry exists and is fresh.
    ///
    /// Never-stored and expired keys both report `None`. Expired entries are
    /// kept; a later policy change may make them fresh again.
    pub fn get(&mut self, key: &CacheKey) -> Option<Value> {
        let now = self.clock.now_ms();
        let ttl = self.effective_ttl(key);

        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now, ttl) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            _ => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Looks up a fresh entry by its display form without touching statistics.
    ///
    /// Parameters may contain the separator, so several keys can share a
    /// display form. The key obtained by [`CacheKey::parse`] wins; any other
    /// multiple match is reported as ambiguous.
    pub fn peek_display(&self, raw: &str) -> Result<Option<(&CacheKey, &CacheEntry)>> {
        let parsed = CacheKey::parse(raw)?;
        let now = self.clock.now_ms();

        let mut matches = self
            .entries
            .iter()
            .filter(|(key, entry)| entry.is_fresh(now, self.effective_ttl(key)))
            .filter(|(key, _)| key.to_string() == raw);

        let Some(first) = matches.next() else {
            return Ok(None);
        };
        let Some(second) = matches.next() else {
            return Ok(Some(first));
        };

        [first, second]
            .into_iter()
            .chain(matches)
            .find(|(key, _)| **key == parsed)
            .map(Some)
            .ok_or_else(|| {
                FeedError::InvalidRequest(format!("Cache key '{}' is ambiguous", raw))
            })
    }

    /// Current time according to the store's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Raw entry access, regardless of freshness.
    pub fn entry(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Effective TTL ==
    /// TTL for the key's category under the current policy.
    pub fn effective_ttl(&self, key: &CacheKey) -> u64 {
        self.policy.ttl_for(key.category())
    }

    // == Policy ==
    pub fn policy(&self) -> &CategoryPolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut CategoryPolicy {
        &mut self.policy
    }

    // == Coalesced Waits ==
    pub fn record_coalesced(&mut self) {
        self.stats.record_coalesced();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Sweep Stale ==
    /// Removes all entries that are not fresh under the current policy.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_stale(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();

        let policy = &self.policy;
        self.entries
            .retain(|key, entry| entry.is_fresh(now, policy.ttl_for(key.category())));

        let removed = before - self.entries.len();
        self.stats.record_swept(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Length ==
    /// Returns the number of stored entries, fresh or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
