//! Request DTOs for the feed cache API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for the TTL operation (PUT /ttl)
///
/// Without a category the default TTL is changed.
#[derive(Debug, Clone, Deserialize)]
pub struct TtlRequest {
    /// Category to override, or `None` for the default
    #[serde(default)]
    pub category: Option<String>,
    /// TTL in milliseconds; negative values are rejected
    pub ttl_ms: i64,
}

impl TtlRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match &self.category {
            Some(category) if category.trim().is_empty() => {
                Some("Category cannot be empty".to_string())
            }
            Some(category) if category.len() > 64 => {
                Some("Category exceeds maximum length of 64 characters".to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_request_deserialize() {
        let json = r#"{"category": "stock", "ttl_ms": 60000}"#;
        let req: TtlRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.category.as_deref(), Some("stock"));
        assert_eq!(req.ttl_ms, 60_000);
    }

    #[test]
    fn test_ttl_request_without_category() {
        let json = r#"{"ttl_ms": -5}"#;
        let req: TtlRequest = serde_json::from_str(json).unwrap();
        assert!(req.category.is_none());
        assert_eq!(req.ttl_ms, -5);
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_validate_empty_category() {
        let req = TtlRequest {
            category: Some("  ".to_string()),
            ttl_ms: 1,
        };
        assert!(req.validate().is_some());
    }
}
