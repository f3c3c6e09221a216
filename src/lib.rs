//! Feed Cache - A caching data-access layer for third-party APIs
//!
//! Serves news, stock, weather, crypto, exchange-rate and economic data
//! through a per-category TTL cache. When an upstream API fails, plausible
//! synthetic data is served and cached instead, so callers never see an
//! upstream error.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod providers;
pub mod service;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::{CacheKey, Source};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{FeedError, Result};
pub use executor::{FallbackExecutor, Resolved};
pub use providers::HttpFetcher;
pub use service::{Feed, FeedService, Peeked};
pub use tasks::spawn_sweep_task;
