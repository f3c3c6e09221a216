//! Provider Adapters
//!
//! One adapter per upstream data source. Each adapter derives a cache key
//! from its request parameters, fetches from its API, and can synthesize a
//! plausible substitute when the API is unavailable.

pub mod central_banks;
pub mod crypto;
pub mod economy;
pub mod http;
pub mod indices;
pub mod news;
pub mod rates;
pub mod stock;
pub mod weather;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::cache::CacheKey;
use crate::error::{FeedError, Result};

pub use central_banks::{CentralBankProvider, CentralBankRates};
pub use crypto::{CryptoData, CryptoParams, CryptoProvider};
pub use economy::{CountryEconomicData, EconomyParams, EconomyProvider};
pub use http::{HttpFetcher, ReqwestFetcher};
pub use indices::{IndicesProvider, MarketIndexData};
pub use news::{ArticleSource, NewsArticle, NewsParams, NewsProvider};
pub use rates::{ExchangeRates, RatesParams, RatesProvider};
pub use stock::{StockParams, StockProvider, StockQuote};
pub use weather::{WeatherData, WeatherParams, WeatherProvider};

// == Provider Trait ==
/// An upstream data source that can be resolved through the fallback executor.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Category name, used as the cache key prefix and TTL policy lookup.
    const CATEGORY: &'static str;

    type Params: Send + Sync;
    type Output: Serialize + DeserializeOwned + Send + Sync;

    /// Derives the cache key. Identical requests map to identical keys.
    fn cache_key(&self, params: &Self::Params) -> CacheKey;

    /// Issues the upstream request and validates the response.
    async fn fetch(&self, params: &Self::Params) -> Result<Self::Output>;

    /// Synthesizes a substitute value without network access.
    fn fallback(&self, params: &Self::Params) -> Self::Output;

    /// Builds request parameters from query-string pairs.
    fn params_from_query(query: &HashMap<String, String>) -> Result<Self::Params>;
}

// == Query Helpers ==
/// First non-empty value among `names`.
pub(crate) fn query_value<'a>(query: &'a HashMap<String, String>, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|name| query.get(*name))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

pub(crate) fn required_value<'a>(query: &'a HashMap<String, String>, name: &str) -> Result<&'a str> {
    query_value(query, &[name])
        .ok_or_else(|| FeedError::InvalidRequest(format!("Missing '{}' parameter", name)))
}

/// Parses an optional count parameter bounded to `1..=max`.
pub(crate) fn count_value(
    query: &HashMap<String, String>,
    name: &str,
    default: u32,
    max: u32,
) -> Result<u32> {
    let Some(raw) = query_value(query, &[name]) else {
        return Ok(default);
    };

    match raw.parse::<u32>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ => Err(FeedError::InvalidRequest(format!(
            "'{}' must be an integer between 1 and {}",
            name, max
        ))),
    }
}

/// Validates an ISO-style alphabetic code (country, currency) of `len` letters.
pub(crate) fn code_value(raw: &str, name: &str, lens: &[usize]) -> Result<String> {
    let code = raw.trim();
    if lens.contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(FeedError::InvalidRequest(format!(
            "'{}' is not a valid {} code",
            raw, name
        )))
    }
}

// == Response Helpers ==
/// Reads a number that upstreams encode either as JSON number or numeric string.
pub(crate) fn number_field(value: &Value, field: &str) -> Result<Option<f64>> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) => s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map(Some)
            .map_err(|_| FeedError::MalformedResponse(format!("'{}' is not numeric: {}", field, s))),
        Some(other) => Err(FeedError::MalformedResponse(format!(
            "'{}' has unexpected type: {}",
            field, other
        ))),
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
