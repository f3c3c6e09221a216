//! Alpha Vantage client
//!
//! Fetches latest stock quotes via the GLOBAL_QUOTE function.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::{endpoint, HttpFetcher};
use super::{number_field, required_value, round_to, Provider};
use crate::cache::CacheKey;
use crate::error::{FeedError, Result};

/// Base URL for the Alpha Vantage API
const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// Latest quote for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockQuote {
    pub symbol: String,
    pub price: f64,
    /// Absolute change since previous close
    pub change: f64,
    /// Change as a percentage of the price
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockParams {
    pub symbol: String,
}

impl StockParams {
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Self {
            symbol: symbol.as_ref().trim().to_ascii_uppercase(),
        }
    }
}

/// Client for Alpha Vantage quotes
#[derive(Debug, Clone)]
pub struct StockProvider {
    fetcher: Arc<dyn HttpFetcher>,
    api_key: String,
}

impl StockProvider {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, api_key: impl Into<String>) -> Self {
        Self {
            fetcher,
            api_key: api_key.into(),
        }
    }

    /// Maps a `Global Quote` object. Missing numeric fields read as zero.
    fn parse_quote(symbol: &str, body: &Value) -> Result<StockQuote> {
        let quote = body
            .get("Global Quote")
            .and_then(Value::as_object)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| FeedError::NoData(format!("no stock data available for {}", symbol)))?;
        let quote = Value::Object(quote.clone());

        Ok(StockQuote {
            symbol: quote
                .get("01. symbol")
                .and_then(Value::as_str)
                .unwrap_or(symbol)
                .to_string(),
            price: number_field(&quote, "05. price")?.unwrap_or(0.0),
            change: number_field(&quote, "09. change")?.unwrap_or(0.0),
            change_percent: number_field(&quote, "10. change percent")?.unwrap_or(0.0),
        })
    }
}

#[async_trait]
impl Provider for StockProvider {
    const CATEGORY: &'static str = "stock";

    type Params = StockParams;
    type Output = StockQuote;

    fn cache_key(&self, params: &StockParams) -> CacheKey {
        CacheKey::new(Self::CATEGORY).param(&params.symbol)
    }

    async fn fetch(&self, params: &StockParams) -> Result<StockQuote> {
        let url = endpoint(
            ALPHA_VANTAGE_URL,
            &[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", params.symbol.as_str()),
                ("apikey", self.api_key.as_str()),
            ],
        )?;

        let body = self.fetcher.get_json(&url).await?;
        Self::parse_quote(&params.symbol, &body)
    }

    fn fallback(&self, params: &StockParams) -> StockQuote {
        let mut rng = rand::thread_rng();
        let price = round_to(rng.gen_range(50.0..1050.0), 2);
        let change = round_to(rng.gen_range(-5.0..5.0), 2);

        StockQuote {
            symbol: params.symbol.clone(),
            price,
            change,
            change_percent: round_to(change / price * 100.0, 2),
        }
    }

    fn params_from_query(query: &HashMap<String, String>) -> Result<StockParams> {
        required_value(query, "symbol").map(StockParams::new)
    }
}
