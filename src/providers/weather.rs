//! OpenWeatherMap client
//!
//! Fetches current conditions for a city.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::{endpoint, HttpFetcher};
use super::{code_value, number_field, query_value, required_value, round_to, Provider};
use crate::cache::CacheKey;
use crate::error::{FeedError, Result};

/// Current weather endpoint
const OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

const DEFAULT_COUNTRY: &str = "FR";

/// Conditions used for synthetic data, paired with their icon codes
const SYNTHETIC_CONDITIONS: [(&str, &str); 5] = [
    ("Clear", "01d"),
    ("Clouds", "03d"),
    ("Rain", "10d"),
    ("Drizzle", "09d"),
    ("Mist", "50d"),
];

/// Current weather at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    /// Temperature in Celsius
    pub temperature: f64,
    pub condition: String,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// "City, CC"
    pub location: String,
    /// OpenWeatherMap icon code
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherParams {
    pub city: String,
    pub country: String,
}

impl WeatherParams {
    pub fn new(city: impl AsRef<str>, country: impl AsRef<str>) -> Self {
        Self {
            city: city.as_ref().trim().to_string(),
            country: country.as_ref().trim().to_ascii_uppercase(),
        }
    }
}

/// Client for OpenWeatherMap current conditions
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    fetcher: Arc<dyn HttpFetcher>,
    api_key: String,
}

impl WeatherProvider {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, api_key: impl Into<String>) -> Self {
        Self {
            fetcher,
            api_key: api_key.into(),
        }
    }

    fn parse_response(params: &WeatherParams, body: &Value) -> Result<WeatherData> {
        let main = body
            .get("main")
            .ok_or_else(|| FeedError::MalformedResponse("missing 'main' block".into()))?;
        let temperature = number_field(main, "temp")?
            .ok_or_else(|| FeedError::MalformedResponse("missing 'main.temp'".into()))?;
        let humidity = number_field(main, "humidity")?.unwrap_or(0.0);

        // m/s to km/h
        let wind_speed = match body.get("wind") {
            Some(wind) => number_field(wind, "speed")?.unwrap_or(0.0) * 3.6,
            None => 0.0,
        };

        let weather = body.pointer("/weather/0");
        let text = |field: &str| {
            weather
                .and_then(|w| w.get(field))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        let city = body
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(params.city.as_str());
        let country = body
            .pointer("/sys/country")
            .and_then(Value::as_str)
            .unwrap_or(params.country.as_str());

        Ok(WeatherData {
            temperature: round_to(temperature, 1),
            condition: text("main").unwrap_or_else(|| "Unknown".to_string()),
            humidity,
            wind_speed: round_to(wind_speed, 1),
            location: format!("{}, {}", city, country),
            icon: text("icon").unwrap_or_default(),
        })
    }
}

#[async_trait]
impl Provider for WeatherProvider {
    const CATEGORY: &'static str = "weather";

    type Params = WeatherParams;
    type Output = WeatherData;

    fn cache_key(&self, params: &WeatherParams) -> CacheKey {
        CacheKey::new(Self::CATEGORY)
            .param(&params.city)
            .param(&params.country)
    }

    async fn fetch(&self, params: &WeatherParams) -> Result<WeatherData> {
        let location = format!("{},{}", params.city, params.country);
        let url = endpoint(
            OPENWEATHER_URL,
            &[
                ("q", location.as_str()),
                ("units", "metric"),
                ("appid", self.api_key.as_str()),
            ],
        )?;

        let body = self.fetcher.get_json(&url).await?;
        Self::parse_response(params, &body)
    }

    fn fallback(&self, params: &WeatherParams) -> WeatherData {
        let mut rng = rand::thread_rng();
        let (condition, icon) = SYNTHETIC_CONDITIONS
            .choose(&mut rng)
            .copied()
            .unwrap_or(SYNTHETIC_CONDITIONS[0]);

        WeatherData {
            temperature: round_to(rng.gen_range(5.0..30.0), 1),
            condition: condition.to_string(),
            humidity: rng.gen_range(30..=90) as f64,
            wind_speed: round_to(rng.gen_range(0.0..40.0), 1),
            location: format!("{}, {}", params.city, params.country),
            icon: icon.to_string(),
        }
    }

    fn params_from_query(query: &HashMap<String, String>) -> Result<WeatherParams> {
        let city = required_value(query, "city")?;
        let country = code_value(
            query_value(query, &["country"]).unwrap_or(DEFAULT_COUNTRY),
            "country",
            &[2],
        )?;
        Ok(WeatherParams::new(city, country))
    }
}
