//! Outbound HTTP
//!
//! The transport seam used by every provider: issue a GET and return parsed
//! JSON, failing on non-success status or an undecodable body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::error;

use crate::error::{FeedError, Result};

/// Issues GET requests and returns the decoded JSON body.
#[async_trait]
pub trait HttpFetcher: Send + Sync + std::fmt::Debug {
    async fn get_json(&self, url: &Url) -> Result<Value>;
}

// == Reqwest Fetcher ==
/// [`HttpFetcher`] backed by a reqwest client.
///
/// Request timeouts are enforced here; the cache layer never times out a
/// fetch on its own.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Creates a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("feedcache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get_json(&self, url: &Url) -> Result<Value> {
        // Query strings carry API keys; keep them out of the logs.
        let endpoint = redact(url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            error!(endpoint = %endpoint, error = %e, "Request failed");
            FeedError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(endpoint = %endpoint, status = %status, "Upstream returned an error status");
            return Err(FeedError::Transport(format!("API error: {}", status)));
        }

        response.json::<Value>().await.map_err(|e| {
            error!(endpoint = %endpoint, error = %e, "Response body is not valid JSON");
            FeedError::MalformedResponse(e.to_string())
        })
    }
}

/// Builds an endpoint URL with encoded query parameters.
pub fn endpoint(base: &str, params: &[(&str, &str)]) -> Result<Url> {
    Url::parse_with_params(base, params)
        .map_err(|e| FeedError::Transport(format!("Invalid endpoint {}: {}", base, e)))
}

fn redact(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.path()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_params() {
        let url = endpoint(
            "https://gnews.io/api/v4/search",
            &[("q", "taux d'intérêt & crédit"), ("max", "5")],
        )
        .unwrap();

        assert_eq!(url.host_str(), Some("gnews.io"));
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0], ("q".to_string(), "taux d'intérêt & crédit".to_string()));
        assert_eq!(pairs[1], ("max".to_string(), "5".to_string()));
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        assert!(matches!(
            endpoint("not a url", &[]),
            Err(FeedError::Transport(_))
        ));
    }

    #[test]
    fn test_redact_strips_query() {
        let url = endpoint(
            "https://www.alphavantage.co/query",
            &[("symbol", "AAPL"), ("apikey", "secret")],
        )
        .unwrap();
        let redacted = redact(&url);
        assert_eq!(redacted, "https://www.alphavantage.co/query");
        assert!(!redacted.contains("secret"));
    }

    #[test]
    fn test_reqwest_fetcher_builds() {
        assert!(ReqwestFetcher::new(Duration::from_secs(5)).is_ok());
    }
}
