//! API Module
//!
//! HTTP handlers and routing for the feed cache REST API.
//!
//! # Endpoints
//! - `GET /feeds/:category` - Resolve a feed, query string holds parameters
//! - `PUT /ttl` - Change the default or a category TTL
//! - `GET /ttl` - Current TTL table
//! - `GET /cache/:key` - Peek at a fresh cached value
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
