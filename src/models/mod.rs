//! Request and Response models for the feed cache API
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::TtlRequest;
pub use responses::{
    ErrorResponse, FeedResponse, HealthResponse, PeekResponse, StatsResponse, TtlResponse,
    TtlSnapshotResponse,
};
