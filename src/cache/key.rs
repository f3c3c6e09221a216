//! Cache Key Module
//!
//! Structured cache keys made of a category and canonical request parameters.

use std::fmt;

use crate::error::{FeedError, Result};

/// Separator used in the display form of a key.
pub const KEY_SEPARATOR: char = '_';

// == Cache Key ==
/// Identifies one cached response.
///
/// Equality and hashing are over the structured `(category, params)` pair,
/// so a parameter that itself contains [`KEY_SEPARATOR`] cannot collide with
/// a different split of the same text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    category: String,
    params: Vec<String>,
}

impl CacheKey {
    // == Constructor ==
    /// Creates a key with no parameters.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            params: Vec::new(),
        }
    }

    /// Appends a canonical parameter.
    pub fn param(mut self, value: impl ToString) -> Self {
        self.params.push(value.to_string());
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    // == Parse ==
    /// Recovers a key from its display form.
    ///
    /// The category is everything before the first separator; the rest is
    /// split on the separator into parameters.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split(KEY_SEPARATOR);
        let category = parts.next().unwrap_or_default();
        if category.is_empty() {
            return Err(FeedError::InvalidRequest(format!(
                "Cache key '{}' has no category",
                raw
            )));
        }

        Ok(Self {
            category: category.to_string(),
            params: parts.map(str::to_string).collect(),
        })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.category)?;
        for param in &self.params {
            write!(f, "{}{}", KEY_SEPARATOR, param)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_params() {
        let key = CacheKey::new("weather").param("Paris").param("FR");
        assert_eq!(key.to_string(), "weather_Paris_FR");

        let key = CacheKey::new("news").param("inflation").param(5);
        assert_eq!(key.to_string(), "news_inflation_5");
    }

    #[test]
    fn test_display_without_params() {
        assert_eq!(CacheKey::new("indices").to_string(), "indices");
    }

    #[test]
    fn test_parse_recovers_category() {
        let key = CacheKey::parse("weather_Paris_FR").unwrap();
        assert_eq!(key.category(), "weather");
        assert_eq!(key.params(), ["Paris", "FR"]);
    }

    #[test]
    fn test_parse_rejects_empty_category() {
        assert!(matches!(
            CacheKey::parse("_AAPL"),
            Err(FeedError::InvalidRequest(_))
        ));
        assert!(CacheKey::parse("").is_err());
    }

    #[test]
    fn test_separator_in_param_does_not_collide() {
        let joined = CacheKey::new("weather").param("New_York").param("US");
        let split = CacheKey::new("weather").param("New").param("York").param("US");

        // Same display text, different keys
        assert_eq!(joined.to_string(), split.to_string());
        assert_ne!(joined, split);
    }
}
