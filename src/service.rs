//! Feed Service
//!
//! Entry point for callers: owns the cache, the fallback executor and one
//! adapter per upstream, and exposes typed lookups, a category-dispatched
//! lookup and the TTL administration knobs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{normalize_category, CacheKey, CacheStats, CacheStore, CategoryPolicy, Source};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{FeedError, Result};
use crate::executor::{FallbackExecutor, Resolved, SharedStore};
use crate::providers::{
    CentralBankProvider, CentralBankRates, CountryEconomicData, CryptoData, CryptoParams,
    CryptoProvider, EconomyParams, EconomyProvider, ExchangeRates, HttpFetcher, IndicesProvider,
    MarketIndexData, NewsArticle, NewsParams, NewsProvider, Provider, RatesParams, RatesProvider,
    ReqwestFetcher, StockParams, StockProvider, StockQuote, WeatherData, WeatherParams,
    WeatherProvider,
};

/// Categories served by [`FeedService::request`].
pub const CATEGORIES: [&str; 8] = [
    NewsProvider::CATEGORY,
    StockProvider::CATEGORY,
    WeatherProvider::CATEGORY,
    CryptoProvider::CATEGORY,
    RatesProvider::CATEGORY,
    EconomyProvider::CATEGORY,
    IndicesProvider::CATEGORY,
    CentralBankProvider::CATEGORY,
];

// == Feed ==
/// Result of a category-dispatched request.
#[derive(Debug, Clone)]
pub struct Feed {
    pub category: &'static str,
    pub key: CacheKey,
    pub data: Value,
    pub source: Source,
}

/// Fresh cache entry as seen by [`FeedService::peek`].
#[derive(Debug, Clone)]
pub struct Peeked {
    pub key: CacheKey,
    pub value: Value,
    pub source: Source,
    pub ttl_remaining_ms: u64,
}

// == Feed Service ==
#[derive(Debug, Clone)]
pub struct FeedService {
    executor: FallbackExecutor,
    news: NewsProvider,
    stock: StockProvider,
    weather: WeatherProvider,
    crypto: CryptoProvider,
    rates: RatesProvider,
    economy: EconomyProvider,
    indices: IndicesProvider,
    central_banks: CentralBankProvider,
}

impl FeedService {
    // == Constructor ==
    /// Creates a service with injected transport and clock.
    pub fn new(config: &Config, fetcher: Arc<dyn HttpFetcher>, clock: Arc<dyn Clock>) -> Self {
        let mut policy = CategoryPolicy::new(config.default_ttl_ms);
        policy.apply_overrides(config.ttl_overrides());

        let store = Arc::new(RwLock::new(CacheStore::new(policy, clock)));

        Self {
            executor: FallbackExecutor::new(store, config.coalesce_requests),
            news: NewsProvider::new(
                fetcher.clone(),
                config.gnews_api_key.clone(),
                config.news_lang.clone(),
            ),
            stock: StockProvider::new(fetcher.clone(), config.alphavantage_api_key.clone()),
            weather: WeatherProvider::new(fetcher.clone(), config.openweather_api_key.clone()),
            crypto: CryptoProvider::new(fetcher.clone()),
            rates: RatesProvider::new(fetcher.clone()),
            economy: EconomyProvider::new(fetcher.clone()),
            indices: IndicesProvider::new(fetcher.clone()),
            central_banks: CentralBankProvider::new(fetcher),
        }
    }

    /// Creates a service that talks to the real APIs.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = ReqwestFetcher::new(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::new(config, Arc::new(fetcher), Arc::new(SystemClock)))
    }

    pub fn store(&self) -> &SharedStore {
        self.executor.store()
    }

    // == Resolve ==
    /// Resolves a request through `provider`, serving cached or synthetic
    /// data as needed.
    pub async fn resolve<P: Provider>(&self, provider: &P, params: P::Params) -> Resolved<P::Output> {
        let key = provider.cache_key(&params);
        self.executor
            .execute_traced(key, || provider.fetch(&params), || provider.fallback(&params))
            .await
    }

    // == Typed Lookups ==
    pub async fn news(&self, keywords: &str, count: u32) -> Vec<NewsArticle> {
        self.resolve(&self.news, NewsParams::new(keywords, count))
            .await
            .value
    }

    pub async fn stock_quote(&self, symbol: &str) -> StockQuote {
        self.resolve(&self.stock, StockParams::new(symbol)).await.value
    }

    pub async fn weather(&self, city: &str, country: &str) -> WeatherData {
        self.resolve(&self.weather, WeatherParams::new(city, country))
            .await
            .value
    }

    pub async fn crypto(&self, currency: &str, limit: u32) -> Vec<CryptoData> {
        self.resolve(&self.crypto, CryptoParams::new(currency, limit))
            .await
            .value
    }

    pub async fn exchange_rates(&self, base: &str) -> ExchangeRates {
        self.resolve(&self.rates, RatesParams::new(base)).await.value
    }

    pub async fn economy(&self, country: &str) -> CountryEconomicData {
        self.resolve(&self.economy, EconomyParams::new(country))
            .await
            .value
    }

    pub async fn market_indices(&self) -> Vec<MarketIndexData> {
        self.resolve(&self.indices, ()).await.value
    }

    pub async fn central_bank_rates(&self) -> CentralBankRates {
        self.resolve(&self.central_banks, ()).await.value
    }

    // == Request ==
    /// Resolves `category` with query-string parameters.
    ///
    /// Fails only for caller errors: an unknown category or missing/invalid
    /// parameters. Upstream failures always resolve to fallback data.
    pub async fn request(&self, category: &str, query: &HashMap<String, String>) -> Result<Feed> {
        match normalize_category(category).as_str() {
            c if c == NewsProvider::CATEGORY => self.request_with(&self.news, query).await,
            c if c == StockProvider::CATEGORY => self.request_with(&self.stock, query).await,
            c if c == WeatherProvider::CATEGORY => self.request_with(&self.weather, query).await,
            c if c == CryptoProvider::CATEGORY => self.request_with(&self.crypto, query).await,
            c if c == RatesProvider::CATEGORY => self.request_with(&self.rates, query).await,
            c if c == EconomyProvider::CATEGORY => self.request_with(&self.economy, query).await,
            c if c == IndicesProvider::CATEGORY => self.request_with(&self.indices, query).await,
            c if c == CentralBankProvider::CATEGORY => {
                self.request_with(&self.central_banks, query).await
            }
            _ => Err(FeedError::UnknownCategory(category.to_string())),
        }
    }

    async fn request_with<P: Provider>(
        &self,
        provider: &P,
        query: &HashMap<String, String>,
    ) -> Result<Feed> {
        let params = P::params_from_query(query)?;
        let key = provider.cache_key(&params);
        let resolved = self.resolve(provider, params).await;

        let data = serde_json::to_value(resolved.value)
            .map_err(|e| FeedError::MalformedResponse(e.to_string()))?;

        Ok(Feed {
            category: P::CATEGORY,
            key,
            data,
            source: resolved.source,
        })
    }

    // == TTL Administration ==
    /// Sets the TTL for categories without an override. Effective immediately.
    pub async fn configure_default_ttl(&self, ttl_ms: u64) {
        self.store().write().await.policy_mut().set_default_ttl(ttl_ms);
        info!("Default TTL set to {}ms", ttl_ms);
    }

    /// Sets the TTL for one category. Effective immediately; the name is
    /// matched the same way [`FeedService::request`] matches it.
    pub async fn configure_category_ttl(&self, category: &str, ttl_ms: u64) -> Result<()> {
        let category = normalize_category(category);
        if category.is_empty() {
            return Err(FeedError::InvalidRequest("Category cannot be empty".to_string()));
        }

        self.store()
            .write()
            .await
            .policy_mut()
            .set_category_ttl(&category, ttl_ms);
        info!("TTL for category '{}' set to {}ms", category, ttl_ms);
        Ok(())
    }

    /// Snapshot of the TTL policy in force.
    pub async fn ttl_snapshot(&self) -> CategoryPolicy {
        self.store().read().await.policy().clone()
    }

    // == Inspection ==
    /// Returns the fresh cached value stored under the display form `raw`.
    pub async fn peek(&self, raw: &str) -> Result<Peeked> {
        let store = self.store().read().await;
        let now = store.now_ms();
        store
            .peek_display(raw)?
            .map(|(key, entry)| Peeked {
                key: key.clone(),
                value: entry.value.clone(),
                source: entry.source,
                ttl_remaining_ms: entry.ttl_remaining_ms(now, store.effective_ttl(key)),
            })
            .ok_or_else(|| FeedError::NotFound(raw.to_string()))
    }

    pub async fn stats(&self) -> CacheStats {
        self.store().read().await.stats()
    }
}

/// Validates a TTL received from an untyped source. Negative values are
/// rejected rather than clamped.
pub fn validate_ttl(ttl_ms: i64) -> Result<u64> {
    u64::try_from(ttl_ms).map_err(|_| {
        FeedError::Configuration(format!("TTL must be non-negative, got {}ms", ttl_ms))
    })
}
