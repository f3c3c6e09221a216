//! Error types for the feed cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Feed Error Enum ==
/// Unified error type for the feed cache.
///
/// `Transport`, `MalformedResponse` and `NoData` describe upstream failures.
/// They are produced by provider fetches and consumed by the fallback
/// executor; they never reach callers of the feed service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// Outbound call failed or returned a non-success status
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream payload did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Upstream answered successfully but without usable data
    #[error("No data available: {0}")]
    NoData(String),

    /// Invalid TTL configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Invalid or missing request parameter
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No provider registered for the category
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Key not present (or not fresh) in the cache
    #[error("Key not found: {0}")]
    NotFound(String),
}

impl FeedError {
    /// True for failures that the fallback executor recovers from.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            FeedError::Transport(_) | FeedError::MalformedResponse(_) | FeedError::NoData(_)
        )
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let status = match &self {
            FeedError::Configuration(_) | FeedError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            FeedError::UnknownCategory(_) | FeedError::NotFound(_) => StatusCode::NOT_FOUND,
            FeedError::Transport(_) | FeedError::MalformedResponse(_) | FeedError::NoData(_) => {
                StatusCode::BAD_GATEWAY
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the feed cache.
pub type Result<T> = std::result::Result<T, FeedError>;
