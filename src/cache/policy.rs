//! Category Policy Module
//!
//! Maps data categories to cache lifetimes.

use std::collections::HashMap;

use crate::cache::{DEFAULT_TTL_MS, WEATHER_TTL_MS};

// == Category Policy ==
/// TTL table consulted at read time.
///
/// Changing a category's TTL takes effect on the next read and is compared
/// against existing entries' original store time, so a change can both
/// invalidate and revive entries that are already stored.
#[derive(Debug, Clone)]
pub struct CategoryPolicy {
    /// TTL for categories without an override
    default_ttl_ms: u64,
    /// Per-category overrides
    overrides: HashMap<String, u64>,
}

impl CategoryPolicy {
    // == Constructor ==
    /// Creates a policy with the given default and the built-in weather override.
    pub fn new(default_ttl_ms: u64) -> Self {
        let mut overrides = HashMap::new();
        overrides.insert("weather".to_string(), WEATHER_TTL_MS);

        Self {
            default_ttl_ms,
            overrides,
        }
    }

    // == Lookup ==
    /// Returns the TTL for `category`, or the default if it has no override.
    pub fn ttl_for(&self, category: &str) -> u64 {
        self.overrides
            .get(category)
            .or_else(|| self.overrides.get(&normalize_category(category)))
            .copied()
            .unwrap_or(self.default_ttl_ms)
    }

    pub fn default_ttl_ms(&self) -> u64 {
        self.default_ttl_ms
    }

    /// Iterates over the explicit overrides.
    pub fn overrides(&self) -> impl Iterator<Item = (&str, u64)> {
        self.overrides.iter().map(|(k, v)| (k.as_str(), *v))
    }

    // == Mutation ==
    pub fn set_default_ttl(&mut self, ttl_ms: u64) {
        self.default_ttl_ms = ttl_ms;
    }

    /// Records or overwrites the TTL for `category`. Names are matched
    /// case-insensitively.
    pub fn set_category_ttl(&mut self, category: impl AsRef<str>, ttl_ms: u64) {
        self.overrides
            .insert(normalize_category(category.as_ref()), ttl_ms);
    }

    /// Installs several overrides at once; later pairs win.
    pub fn apply_overrides<I, S>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        for (category, ttl_ms) in overrides {
            self.set_category_ttl(category, ttl_ms);
        }
    }
}

/// Canonical form of a category name: trimmed, lower-case.
pub fn normalize_category(category: &str) -> String {
    category.trim().to_ascii_lowercase()
}

impl Default for CategoryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TTL_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_weather_override() {
        let policy = CategoryPolicy::default();
        assert_eq!(policy.ttl_for("weather"), 600_000);
        assert_eq!(policy.ttl_for("stock"), 1_800_000);
        assert_eq!(policy.default_ttl_ms(), 1_800_000);
    }

    #[test]
    fn test_last_write_wins() {
        let mut policy = CategoryPolicy::default();
        policy.set_category_ttl("stock", 60_000);
        policy.set_category_ttl("stock", 5_000);
        assert_eq!(policy.ttl_for("stock"), 5_000);
    }

    #[test]
    fn test_default_change_does_not_touch_overrides() {
        let mut policy = CategoryPolicy::default();
        policy.set_default_ttl(1_000);
        assert_eq!(policy.ttl_for("news"), 1_000);
        assert_eq!(policy.ttl_for("weather"), 600_000);
    }

    #[test]
    fn test_category_names_are_case_insensitive() {
        let mut policy = CategoryPolicy::default();
        policy.set_category_ttl(" Weather ", 1_000);
        assert_eq!(policy.ttl_for("weather"), 1_000);
        assert_eq!(policy.ttl_for("WEATHER"), 1_000);
        assert_eq!(policy.overrides().count(), 1);
    }

    #[test]
    fn test_apply_overrides() {
        let mut policy = CategoryPolicy::new(10);
        policy.apply_overrides([("news", 20), ("crypto", 30), ("news", 40)]);
        assert_eq!(policy.ttl_for("news"), 40);
        assert_eq!(policy.ttl_for("crypto"), 30);
        assert_eq!(policy.overrides().count(), 3);
    }
}
