//! GNews client
//!
//! Searches news articles by keywords.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::http::{endpoint, HttpFetcher};
use super::{count_value, query_value, Provider};
use crate::cache::CacheKey;
use crate::error::{FeedError, Result};

/// Search endpoint for the GNews API
const GNEWS_SEARCH_URL: &str = "https://gnews.io/api/v4/search";

/// Largest page size GNews accepts
const MAX_ARTICLES: u32 = 100;

const DEFAULT_COUNT: u32 = 5;

/// A news article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub description: String,
    pub url: String,
    pub source: ArticleSource,
    /// Publication time, RFC 3339
    pub published_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_to_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsParams {
    pub keywords: String,
    pub count: u32,
}

impl NewsParams {
    pub fn new(keywords: impl Into<String>, count: u32) -> Self {
        Self {
            keywords: keywords.into().trim().to_string(),
            count,
        }
    }
}

/// Client for the GNews search API
#[derive(Debug, Clone)]
pub struct NewsProvider {
    fetcher: Arc<dyn HttpFetcher>,
    api_key: String,
    lang: String,
}

impl NewsProvider {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, api_key: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            fetcher,
            api_key: api_key.into(),
            lang: lang.into(),
        }
    }

    fn parse_article(raw: &Value) -> NewsArticle {
        let text = |field: &str| {
            raw.get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        NewsArticle {
            title: text("title"),
            description: text("description"),
            url: text("url"),
            source: ArticleSource {
                name: raw
                    .pointer("/source/name")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .unwrap_or("Unknown source")
                    .to_string(),
            },
            published_at: text("publishedAt"),
            url_to_image: raw
                .get("image")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

#[async_trait]
impl Provider for NewsProvider {
    const CATEGORY: &'static str = "news";

    type Params = NewsParams;
    type Output = Vec<NewsArticle>;

    fn cache_key(&self, params: &NewsParams) -> CacheKey {
        CacheKey::new(Self::CATEGORY)
            .param(&params.keywords)
            .param(params.count)
    }

    async fn fetch(&self, params: &NewsParams) -> Result<Vec<NewsArticle>> {
        let max = params.count.to_string();
        let url = endpoint(
            GNEWS_SEARCH_URL,
            &[
                ("q", params.keywords.as_str()),
                ("max", max.as_str()),
                ("lang", self.lang.as_str()),
                ("apikey", self.api_key.as_str()),
            ],
        )?;

        let body = self.fetcher.get_json(&url).await?;
        let articles = body
            .get("articles")
            .and_then(Value::as_array)
            .ok_or_else(|| FeedError::MalformedResponse("missing 'articles' array".into()))?;

        Ok(articles.iter().map(Self::parse_article).collect())
    }

    fn fallback(&self, params: &NewsParams) -> Vec<NewsArticle> {
        let now = Utc::now().to_rfc3339();
        let keywords = &params.keywords;

        let templates = [
            (
                format!("Latest trends in {}", keywords),
                format!(
                    "Discover the latest trends in {} and how they may affect your finances.",
                    keywords
                ),
                "https://example.com/article1",
                "Finance News",
            ),
            (
                format!("How to optimise your {}", keywords),
                format!(
                    "Experts share their advice on optimising your {} and maximising returns.",
                    keywords
                ),
                "https://example.com/article2",
                "Economy Plus",
            ),
        ];

        templates
            .into_iter()
            .take(params.count as usize)
            .map(|(title, description, url, source)| NewsArticle {
                title,
                description,
                url: url.to_string(),
                source: ArticleSource {
                    name: source.to_string(),
                },
                published_at: now.clone(),
                url_to_image: None,
            })
            .collect()
    }

    fn params_from_query(query: &HashMap<String, String>) -> Result<NewsParams> {
        let keywords = query_value(query, &["keywords", "q"]).ok_or_else(|| {
            FeedError::InvalidRequest("Missing 'keywords' parameter".to_string())
        })?;
        let count = count_value(query, "count", DEFAULT_COUNT, MAX_ARTICLES)?;
        Ok(NewsParams::new(keywords, count))
    }
}
