//! Scripted fetcher for provider tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use super::HttpFetcher;
use crate::error::{FeedError, Result};

/// Answers requests whose URL contains a registered fragment.
#[derive(Debug, Default)]
pub struct MockFetcher {
    routes: Vec<(String, Result<Value>)>,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, fragment: &str, response: Result<Value>) -> Self {
        self.routes.push((fragment.to_string(), response));
        self
    }

    /// A fetcher where every request fails at the transport level.
    pub fn failing() -> Self {
        Self::new().route("", Err(FeedError::Transport("network unreachable".into())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetcher for MockFetcher {
    async fn get_json(&self, url: &Url) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());

        self.routes
            .iter()
            .find(|(fragment, _)| url.as_str().contains(fragment.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| Err(FeedError::Transport(format!("no route for {}", url))))
    }
}
