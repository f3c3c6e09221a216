//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::cache::{normalize_category, DEFAULT_TTL_MS, WEATHER_TTL_MS};

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL in milliseconds for categories without an override
    pub default_ttl_ms: u64,
    /// TTL in milliseconds for the weather category
    pub weather_ttl_ms: u64,
    /// Additional per-category TTL overrides in milliseconds
    pub category_ttls: Vec<(String, u64)>,
    /// Timeout applied to every upstream request, in seconds
    pub request_timeout_secs: u64,
    /// Stale-entry sweep interval in seconds, 0 (the default) disables the sweep
    pub sweep_interval_secs: u64,
    /// Share one upstream fetch among concurrent callers of the same key
    pub coalesce_requests: bool,
    /// GNews API key
    pub gnews_api_key: String,
    /// Language requested from GNews
    pub news_lang: String,
    /// Alpha Vantage API key
    pub alphavantage_api_key: String,
    /// OpenWeatherMap API key
    pub openweather_api_key: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DEFAULT_TTL_MS` - Default cache TTL (default: 1800000)
    /// - `WEATHER_TTL_MS` - Weather cache TTL (default: 600000)
    /// - `CATEGORY_TTLS` - Extra overrides, `stock=60000,news=900000`
    /// - `REQUEST_TIMEOUT_SECS` - Upstream request timeout (default: 10)
    /// - `SWEEP_INTERVAL_SECS` - Stale sweep frequency (default: 0 = off). When
    ///   on, swept entries can no longer be revived by a later, longer TTL.
    /// - `COALESCE_REQUESTS` - Single-flight upstream calls (default: true)
    /// - `GNEWS_API_KEY`, `NEWS_LANG` (default: fr)
    /// - `ALPHAVANTAGE_API_KEY` (default: demo)
    /// - `OPENWEATHER_API_KEY`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            default_ttl_ms: parse_var("DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            weather_ttl_ms: parse_var("WEATHER_TTL_MS").unwrap_or(defaults.weather_ttl_ms),
            category_ttls: env::var("CATEGORY_TTLS")
                .map(|raw| parse_category_ttls(&raw))
                .unwrap_or_default(),
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            sweep_interval_secs: parse_var("SWEEP_INTERVAL_SECS")
                .unwrap_or(defaults.sweep_interval_secs),
            coalesce_requests: parse_var("COALESCE_REQUESTS")
                .unwrap_or(defaults.coalesce_requests),
            gnews_api_key: env::var("GNEWS_API_KEY").unwrap_or(defaults.gnews_api_key),
            news_lang: env::var("NEWS_LANG").unwrap_or(defaults.news_lang),
            alphavantage_api_key: env::var("ALPHAVANTAGE_API_KEY")
                .unwrap_or(defaults.alphavantage_api_key),
            openweather_api_key: env::var("OPENWEATHER_API_KEY")
                .unwrap_or(defaults.openweather_api_key),
        }
    }

    /// All TTL overrides in application order: weather first, then `category_ttls`.
    pub fn ttl_overrides(&self) -> Vec<(String, u64)> {
        let mut overrides = vec![("weather".to_string(), self.weather_ttl_ms)];
        overrides.extend(self.category_ttls.iter().cloned());
        overrides
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            default_ttl_ms: DEFAULT_TTL_MS,
            weather_ttl_ms: WEATHER_TTL_MS,
            category_ttls: Vec::new(),
            request_timeout_secs: 10,
            sweep_interval_secs: 0,
            coalesce_requests: true,
            gnews_api_key: String::new(),
            news_lang: "fr".to_string(),
            alphavantage_api_key: "demo".to_string(),
            openweather_api_key: String::new(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Parses `category=ms` pairs separated by commas. Invalid pairs are skipped.
fn parse_category_ttls(raw: &str) -> Vec<(String, u64)> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let parsed = pair
                .split_once('=')
                .map(|(category, ms)| (normalize_category(category), ms.trim().parse::<u64>()))
                .and_then(|(category, ms)| match ms {
                    Ok(ms) if !category.is_empty() => Some((category, ms)),
                    _ => None,
                });
            if parsed.is_none() {
                warn!("Ignoring invalid CATEGORY_TTLS entry '{}'", pair);
            }
            parsed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.default_ttl_ms, 1_800_000);
        assert_eq!(config.weather_ttl_ms, 600_000);
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.sweep_interval_secs, 0);
        assert!(config.coalesce_requests);
        assert!(config.category_ttls.is_empty());
    }

    #[test]
    fn test_parse_category_ttls() {
        let parsed = parse_category_ttls(" Stock=60000, news = 900000,bad,=5,crypto=-1,");
        assert_eq!(
            parsed,
            vec![("stock".to_string(), 60_000), ("news".to_string(), 900_000)]
        );
    }

    #[test]
    fn test_ttl_overrides_order() {
        let config = Config {
            weather_ttl_ms: 1_000,
            category_ttls: vec![("weather".to_string(), 2_000), ("stock".to_string(), 3_000)],
            ..Config::default()
        };
        let overrides = config.ttl_overrides();
        assert_eq!(overrides[0], ("weather".to_string(), 1_000));
        // Explicit CATEGORY_TTLS entries are applied last and win
        assert_eq!(overrides[1], ("weather".to_string(), 2_000));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("SERVER_PORT");
        env::remove_var("DEFAULT_TTL_MS");
        env::remove_var("CATEGORY_TTLS");
        env::remove_var("COALESCE_REQUESTS");

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.default_ttl_ms, 1_800_000);
        assert!(config.category_ttls.is_empty());
        assert!(config.coalesce_requests);
    }
}
