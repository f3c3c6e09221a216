//! Cache Module
//!
//! Provides the in-memory response cache with per-category TTL policies.

mod entry;
mod key;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, Source};
pub use key::{CacheKey, KEY_SEPARATOR};
pub use policy::{normalize_category, CategoryPolicy};
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// TTL applied to categories without an explicit override (30 minutes)
pub const DEFAULT_TTL_MS: u64 = 30 * 60 * 1000;

/// Built-in TTL for the weather category (10 minutes)
pub const WEATHER_TTL_MS: u64 = 10 * 60 * 1000;
