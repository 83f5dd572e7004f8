// src/fetch/mod.rs
//! Thin clients for the external news-search and trends-search APIs.
//!
//! Contract: empty results and fetch errors are distinct. An empty list is
//! a valid answer (the handler maps it to 404); a `FetchError` means the
//! upstream was unreachable or rejected the call (502/500 at the handler).

pub mod serpapi;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use serpapi::SerpApiClient;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

/// A normalized externally fetched article, before summarization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawArticle {
    pub title: String,
    pub snippet: String,
    pub source: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub category: String,
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Search news for `query`, bounded by `limit`.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawArticle>, FetchError>;
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait TrendsProvider: Send + Sync {
    /// Currently trending search terms for a geo code, rank order.
    async fn trending(&self, geo: &str) -> Result<Vec<String>, FetchError>;
    /// Interest-over-time payload for one topic. Opaque to the caller.
    async fn interest_over_time(&self, topic: &str) -> Result<Option<Value>, FetchError>;
    fn name(&self) -> &'static str;
}

/// Stand-in used when the upstream API key is absent: every call fails with
/// `NotConfigured`, which the handler surfaces as a 500 configuration error.
pub struct UnconfiguredProvider;

#[async_trait]
impl NewsProvider for UnconfiguredProvider {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<RawArticle>, FetchError> {
        Err(FetchError::NotConfigured("SERPAPI_KEY"))
    }
    fn name(&self) -> &'static str {
        "unconfigured"
    }
}

#[async_trait]
impl TrendsProvider for UnconfiguredProvider {
    async fn trending(&self, _geo: &str) -> Result<Vec<String>, FetchError> {
        Err(FetchError::NotConfigured("SERPAPI_KEY"))
    }
    async fn interest_over_time(&self, _topic: &str) -> Result<Option<Value>, FetchError> {
        Err(FetchError::NotConfigured("SERPAPI_KEY"))
    }
    fn name(&self) -> &'static str {
        "unconfigured"
    }
}
