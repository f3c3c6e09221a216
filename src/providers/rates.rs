//! Frankfurter client
//!
//! Fetches reference exchange rates published by the ECB.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::{endpoint, HttpFetcher};
use super::{code_value, query_value, round_to, Provider};
use crate::cache::CacheKey;
use crate::error::{FeedError, Result};

/// Latest-rates endpoint of the Frankfurter API
const FRANKFURTER_LATEST_URL: &str = "https://api.frankfurter.app/latest";

const DEFAULT_BASE: &str = "EUR";

/// Approximate units per EUR used for synthetic data
const REFERENCE_RATES: [(&str, f64); 8] = [
    ("EUR", 1.0),
    ("USD", 1.08),
    ("GBP", 0.86),
    ("JPY", 162.0),
    ("CHF", 0.97),
    ("CAD", 1.47),
    ("AUD", 1.64),
    ("CNY", 7.8),
];

/// Exchange rates relative to a base currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    pub base: String,
    /// Publication date, YYYY-MM-DD
    pub date: String,
    pub rates: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatesParams {
    pub base: String,
}

impl RatesParams {
    pub fn new(base: impl AsRef<str>) -> Self {
        Self {
            base: base.as_ref().trim().to_ascii_uppercase(),
        }
    }
}

/// Client for the Frankfurter exchange-rate API
#[derive(Debug, Clone)]
pub struct RatesProvider {
    fetcher: Arc<dyn HttpFetcher>,
}

impl RatesProvider {
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Provider for RatesProvider {
    const CATEGORY: &'static str = "rates";

    type Params = RatesParams;
    type Output = ExchangeRates;

    fn cache_key(&self, params: &RatesParams) -> CacheKey {
        CacheKey::new(Self::CATEGORY).param(&params.base)
    }

    async fn fetch(&self, params: &RatesParams) -> Result<ExchangeRates> {
        let url = endpoint(FRANKFURTER_LATEST_URL, &[("from", params.base.as_str())])?;

        let body: Value = self.fetcher.get_json(&url).await?;
        let rates: ExchangeRates = serde_json::from_value(body)
            .map_err(|e| FeedError::MalformedResponse(format!("rates: {}", e)))?;

        if rates.rates.is_empty() {
            return Err(FeedError::NoData(format!("no rates for {}", params.base)));
        }
        Ok(rates)
    }

    /// Cross rates from the reference table, with small random jitter.
    /// Unknown bases are treated as EUR-valued.
    fn fallback(&self, params: &RatesParams) -> ExchangeRates {
        let mut rng = rand::thread_rng();
        let base_per_eur = REFERENCE_RATES
            .iter()
            .find(|(code, _)| *code == params.base)
            .map(|(_, rate)| *rate)
            .unwrap_or(1.0);

        let rates = REFERENCE_RATES
            .iter()
            .filter(|(code, _)| *code != params.base)
            .map(|(code, per_eur)| {
                let jitter = rng.gen_range(0.99_f64..1.01);
                (code.to_string(), round_to(per_eur / base_per_eur * jitter, 4))
            })
            .collect();

        ExchangeRates {
            base: params.base.clone(),
            date: Utc::now().date_naive().to_string(),
            rates,
        }
    }

    fn params_from_query(query: &HashMap<String, String>) -> Result<RatesParams> {
        let base = query_value(query, &["base"]).unwrap_or(DEFAULT_BASE);
        code_value(base, "currency", &[3]).map(RatesParams::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::MockFetcher;
    use serde_json::json;

    fn provider(fetcher: MockFetcher) -> RatesProvider {
        RatesProvider::new(Arc::new(fetcher))
    }

    #[test]
    fn test_cache_key() {
        let rates = provider(MockFetcher::new());
        assert_eq!(rates.cache_key(&RatesParams::new("usd")).to_string(), "rates_USD");
    }

    #[tokio::test]
    async fn test_fetch_parses_rates() {
        let rates = provider(MockFetcher::new().route(
            "frankfurter.app",
            Ok(json!({
                "amount": 1.0,
                "base": "EUR",
                "date": "2024-05-03",
                "rates": {"USD": 1.0765, "GBP": 0.8571}
            })),
        ));

        let result = rates.fetch(&RatesParams::new("EUR")).await.unwrap();
        assert_eq!(result.base, "EUR");
        assert_eq!(result.date, "2024-05-03");
        assert_eq!(result.rates["USD"], 1.0765);
    }

    #[tokio::test]
    async fn test_fetch_unknown_currency_is_malformed() {
        let rates = provider(
            MockFetcher::new().route("frankfurter.app", Ok(json!({"message": "not found"}))),
        );
        let result = rates.fetch(&RatesParams::new("XYZ")).await;
        assert!(matches!(result, Err(FeedError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_fetch_empty_rates_is_no_data() {
        let rates = provider(MockFetcher::new().route(
            "frankfurter.app",
            Ok(json!({"base": "EUR", "date": "2024-05-03", "rates": {}})),
        ));
        let result = rates.fetch(&RatesParams::new("EUR")).await;
        assert!(matches!(result, Err(FeedError::NoData(_))));
    }

    #[test]
    fn test_fallback_cross_rates() {
        let rates = provider(MockFetcher::new());
        let result = rates.fallback(&RatesParams::new("USD"));

        assert_eq!(result.base, "USD");
        assert!(!result.rates.contains_key("USD"));
        let eur = result.rates["EUR"];
        assert!((eur - 1.0 / 1.08).abs() < 0.02);
        assert_eq!(result.rates.len(), REFERENCE_RATES.len() - 1);
    }
}
