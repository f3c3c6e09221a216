//! Response DTOs for the feed cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, CategoryPolicy, Source};
use crate::service::{Feed, Peeked};

/// Response body for a feed lookup (GET /feeds/:category)
#[derive(Debug, Clone, Serialize)]
pub struct FeedResponse {
    pub category: String,
    /// Display form of the cache key
    pub key: String,
    /// Where the data came from
    pub source: Source,
    pub data: Value,
}

impl From<Feed> for FeedResponse {
    fn from(feed: Feed) -> Self {
        Self {
            category: feed.category.to_string(),
            key: feed.key.to_string(),
            source: feed.source,
            data: feed.data,
        }
    }
}

/// Response body for the TTL operation (PUT /ttl)
#[derive(Debug, Clone, Serialize)]
pub struct TtlResponse {
    pub message: String,
    /// Category changed, `None` for the default TTL
    pub category: Option<String>,
    pub ttl_ms: u64,
}

impl TtlResponse {
    pub fn new(category: Option<String>, ttl_ms: u64) -> Self {
        let message = match &category {
            Some(category) => format!("TTL for '{}' set to {}ms", category, ttl_ms),
            None => format!("Default TTL set to {}ms", ttl_ms),
        };
        Self {
            message,
            category,
            ttl_ms,
        }
    }
}

/// Response body for the TTL table (GET /ttl)
#[derive(Debug, Clone, Serialize)]
pub struct TtlSnapshotResponse {
    pub default_ttl_ms: u64,
    pub categories: BTreeMap<String, u64>,
}

impl From<&CategoryPolicy> for TtlSnapshotResponse {
    fn from(policy: &CategoryPolicy) -> Self {
        Self {
            default_ttl_ms: policy.default_ttl_ms(),
            categories: policy
                .overrides()
                .map(|(category, ttl)| (category.to_string(), ttl))
                .collect(),
        }
    }
}

/// Response body for a cache peek (GET /cache/:key)
#[derive(Debug, Clone, Serialize)]
pub struct PeekResponse {
    pub key: String,
    pub source: Source,
    /// Time left before the entry goes stale
    pub ttl_remaining_ms: u64,
    pub value: Value,
}

impl From<Peeked> for PeekResponse {
    fn from(peeked: Peeked) -> Self {
        Self {
            key: peeked.key.to_string(),
            source: peeked.source,
            ttl_remaining_ms: peeked.ttl_remaining_ms,
            value: peeked.value,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Share of resolved misses served by synthetic data
    pub fallback_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            fallback_rate: stats.fallback_rate(),
            stats,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Categories that can be requested
    pub categories: Vec<String>,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(categories: &[&str]) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
