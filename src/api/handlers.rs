//! API Handlers
//!
//! HTTP request handlers for each feed cache endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;

use crate::cache::normalize_category;
use crate::config::Config;
use crate::error::{FeedError, Result};
use crate::models::{
    FeedResponse, HealthResponse, PeekResponse, StatsResponse, TtlRequest, TtlResponse,
    TtlSnapshotResponse,
};
use crate::service::{validate_ttl, FeedService, CATEGORIES};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FeedService>,
}

impl AppState {
    pub fn new(service: FeedService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Creates a new AppState backed by the real upstream APIs.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(FeedService::from_config(config)?))
    }
}

/// Handler for GET /feeds/:category
///
/// Query-string pairs are passed to the category's provider. Always answers
/// with data unless the request itself is invalid.
pub async fn feed_handler(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<FeedResponse>> {
    let feed = state.service.request(&category, &query).await?;
    debug!("Served {} from {:?}", feed.key, feed.source);
    Ok(Json(feed.into()))
}

/// Handler for PUT /ttl
pub async fn set_ttl_handler(
    State(state): State<AppState>,
    Json(req): Json<TtlRequest>,
) -> Result<Json<TtlResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(FeedError::InvalidRequest(error_msg));
    }
    let ttl_ms = validate_ttl(req.ttl_ms)?;

    match &req.category {
        Some(category) => {
            state
                .service
                .configure_category_ttl(category, ttl_ms)
                .await?
        }
        None => state.service.configure_default_ttl(ttl_ms).await,
    }

    let category = req.category.as_deref().map(normalize_category);
    Ok(Json(TtlResponse::new(category, ttl_ms)))
}

/// Handler for GET /ttl
pub async fn get_ttl_handler(State(state): State<AppState>) -> Json<TtlSnapshotResponse> {
    let policy = state.service.ttl_snapshot().await;
    Json(TtlSnapshotResponse::from(&policy))
}

/// Handler for GET /cache/:key
///
/// Returns the fresh value stored under a display-form key without
/// counting as a lookup.
pub async fn peek_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<PeekResponse>> {
    let peeked = state.service.peek(&key).await?;
    Ok(Json(peeked.into()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.service.stats().await.into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(&CATEGORIES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Source;
    use crate::clock::ManualClock;
    use crate::providers::testing::MockFetcher;

    fn create_state() -> AppState {
        let service = FeedService::new(
            &Config::default(),
            Arc::new(MockFetcher::failing()),
            Arc::new(ManualClock::new(1_700_000_000_000)),
        );
        AppState::new(service)
    }

    fn query(pairs: &[(&str, &str)]) -> Query<HashMap<String, String>> {
        Query(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_feed_then_peek_handler() {
        let state = create_state();

        let response = feed_handler(
            State(state.clone()),
            Path("stock".to_string()),
            query(&[("symbol", "aapl")]),
        )
        .await
        .unwrap();
        assert_eq!(response.key, "stock_AAPL");
        assert_eq!(response.source, Source::Fallback);

        let peeked = peek_handler(State(state), Path("stock_AAPL".to_string()))
            .await
            .unwrap();
        assert_eq!(peeked.value, response.data);
    }

    #[tokio::test]
    async fn test_feed_unknown_category() {
        let state = create_state();
        let result = feed_handler(State(state), Path("horoscope".to_string()), query(&[])).await;
        assert!(matches!(result, Err(FeedError::UnknownCategory(_))));
    }

    #[tokio::test]
    async fn test_set_ttl_handler() {
        let state = create_state();

        let req = TtlRequest {
            category: Some("Crypto".to_string()),
            ttl_ms: 120_000,
        };
        let response = set_ttl_handler(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(response.ttl_ms, 120_000);
        assert_eq!(response.category.as_deref(), Some("crypto"));

        let snapshot = get_ttl_handler(State(state)).await;
        assert_eq!(snapshot.categories.get("crypto"), Some(&120_000));
    }

    #[tokio::test]
    async fn test_set_negative_ttl_rejected() {
        let state = create_state();

        let req = TtlRequest {
            category: None,
            ttl_ms: -1,
        };
        let result = set_ttl_handler(State(state.clone()), Json(req)).await;
        assert!(matches!(result, Err(FeedError::Configuration(_))));

        let snapshot = get_ttl_handler(State(state)).await;
        assert_eq!(snapshot.default_ttl_ms, 1_800_000);
    }

    #[tokio::test]
    async fn test_peek_missing_key() {
        let state = create_state();
        let result = peek_handler(State(state), Path("news_x_5".to_string())).await;
        assert!(matches!(result, Err(FeedError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = create_state();
        let response = stats_handler(State(state)).await;
        assert_eq!(response.stats.hits, 0);
        assert_eq!(response.stats.misses, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.categories.len(), 8);
    }
}
