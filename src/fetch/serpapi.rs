// src/fetch/serpapi.rs
//! SerpAPI client covering both engines the service needs:
//! `google_news` for article search and `google_trends_trending_now` /
//! `google_trends` (TIMESERIES) for trending topics and their interest data.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{FetchError, NewsProvider, RawArticle, TrendsProvider};

const ENDPOINT: &str = "https://serpapi.com/search.json";

pub struct SerpApiClient {
    http: reqwest::Client,
    api_key: String,
}

impl SerpApiClient {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("newsdesk/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(12))
            .build()
            .expect("reqwest client");
        Self { http, api_key }
    }

    async fn call(&self, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("api_key", self.api_key.as_str()));
        let resp = self.http.get(ENDPOINT).query(&query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                message: truncate(&message, 300),
            });
        }
        let body: Value = resp.json().await?;
        // SerpAPI reports engine-level failures inside a 200 body.
        if let Some(err) = body.get("error").and_then(Value::as_str) {
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                message: err.to_string(),
            });
        }
        Ok(body)
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[derive(Debug, Deserialize)]
struct NewsResult {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    source: Option<NewsSource>,
    #[serde(default)]
    stories: Vec<NewsResult>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NewsSource {
    Named { name: String },
    Plain(String),
}

impl NewsSource {
    fn label(&self) -> &str {
        match self {
            NewsSource::Named { name } => name,
            NewsSource::Plain(s) => s,
        }
    }
}

fn map_result(r: NewsResult, out: &mut Vec<RawArticle>) {
    // Nested story clusters flatten into the same list.
    let NewsResult {
        title,
        snippet,
        link,
        thumbnail,
        date,
        source,
        stories,
    } = r;
    // Rows without both a title and a link are unusable.
    if let (Some(title), Some(url)) = (title, link) {
        out.push(RawArticle {
            title,
            snippet: snippet.unwrap_or_default(),
            source: source
                .as_ref()
                .map(|s| s.label().to_string())
                .unwrap_or_else(|| "Google News".to_string()),
            url,
            image_url: thumbnail,
            published_at: date,
            category: "News".to_string(),
        });
    }
    for story in stories {
        map_result(story, out);
    }
}

#[async_trait]
impl NewsProvider for SerpApiClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<RawArticle>, FetchError> {
        let body = self
            .call(&[
                ("engine", "google_news"),
                ("hl", "en"),
                ("q", query),
            ])
            .await?;

        let rows: Vec<NewsResult> = body
            .get("news_results")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| FetchError::Transport(format!("malformed news_results: {e}")))?
            .unwrap_or_default();

        let mut articles = Vec::new();
        for r in rows {
            map_result(r, &mut articles);
            if articles.len() >= limit {
                break;
            }
        }
        articles.truncate(limit);
        tracing::debug!(query, count = articles.len(), "news search complete");
        Ok(articles)
    }

    fn name(&self) -> &'static str {
        "serpapi-news"
    }
}

#[async_trait]
impl TrendsProvider for SerpApiClient {
    async fn trending(&self, geo: &str) -> Result<Vec<String>, FetchError> {
        let body = self
            .call(&[("engine", "google_trends_trending_now"), ("geo", geo)])
            .await?;

        let topics = body
            .get("trending_searches")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        item.get("query")
                            .or_else(|| item.get("title"))
                            .and_then(Value::as_str)
                            .or_else(|| item.as_str())
                            .map(str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(topics)
    }

    async fn interest_over_time(&self, topic: &str) -> Result<Option<Value>, FetchError> {
        let body = self
            .call(&[
                ("engine", "google_trends"),
                ("q", topic),
                ("data_type", "TIMESERIES"),
            ])
            .await?;
        Ok(body.get("interest_over_time").cloned())
    }

    fn name(&self) -> &'static str {
        "serpapi-trends"
    }
}
