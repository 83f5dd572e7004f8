// src/summarize.rs
//! Generative-AI summarization: provider abstraction, the Gemini REST
//! client, and the batched summarizers built on top of it.
//!
//! The summarizers are total: they return exactly one display text per
//! input item, order preserved, whether the AI call succeeds, errors,
//! times out, or is disabled. An AI failure is never a request failure.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::AppConfig;
use crate::fetch::RawArticle;
use crate::merge::resolve_display_text;

pub const DEVELOPING_STORY_FALLBACK: &str = "This story is developing.";
pub const TRENDING_FALLBACK: &str =
    "This topic is currently trending and generating significant public interest.";

// ---------------------------------------------------------------------------
// Provider abstraction
// ---------------------------------------------------------------------------

/// One prompt in, optionally one text completion out. `None` covers every
/// failure mode (disabled, transport, upstream, unusable output); callers
/// fall back and move on.
#[async_trait]
pub trait AiClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Option<String>;
    fn name(&self) -> &'static str;
}

/// Gemini REST client (`generateContent` endpoint, key as query param).
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("newsdesk/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiTextPart>,
}

#[derive(Deserialize)]
struct GeminiTextPart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl AiClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Option<String> {
        metrics::counter!("ai_calls_total").increment(1);
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let req = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };
        let resp = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&req)
            .send()
            .await
            .map_err(|e| tracing::warn!(error = %e, "gemini transport error"))
            .ok()?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(%status, "gemini returned non-success");
            return None;
        }
        let body: GeminiResponse = resp
            .json()
            .await
            .map_err(|e| tracing::warn!(error = %e, "gemini body parse error"))
            .ok()?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Tagged "AI off" state: always `None`. Replaces scattered null checks.
pub struct DisabledClient;

#[async_trait]
impl AiClient for DisabledClient {
    async fn generate(&self, _prompt: &str) -> Option<String> {
        None
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Build the process-wide client from config: real Gemini when a key is
/// present, otherwise the disabled variant.
pub fn build_ai_client(cfg: &AppConfig) -> std::sync::Arc<dyn AiClient> {
    match &cfg.google_api_key {
        Some(key) => std::sync::Arc::new(GeminiClient::new(key.clone())),
        None => {
            tracing::warn!("GOOGLE_API_KEY absent; AI summarization disabled, fallbacks in use");
            std::sync::Arc::new(DisabledClient)
        }
    }
}

// ---------------------------------------------------------------------------
// Defensive response parsing
// ---------------------------------------------------------------------------

static RE_JSON_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("json array regex"));
static RE_JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("json object regex"));

/// Pull the first JSON array out of a model response that may be wrapped in
/// prose or code fences. Unparsable input yields an empty vec.
pub fn extract_json_array(raw: &str) -> Vec<Value> {
    RE_JSON_ARRAY
        .find(raw)
        .and_then(|m| serde_json::from_str::<Vec<Value>>(m.as_str()).ok())
        .unwrap_or_default()
}

pub fn extract_json_object(raw: &str) -> Option<Value> {
    RE_JSON_OBJECT
        .find(raw)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .filter(Value::is_object)
}

// ---------------------------------------------------------------------------
// Article summarization (batched)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummarizedArticle {
    pub title: String,
    pub snippet: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub category: String,
}

fn chunk_prompt(chunk: &[RawArticle]) -> String {
    let payload: Vec<Value> = chunk
        .iter()
        .enumerate()
        .map(|(i, a)| {
            serde_json::json!({
                "order": i + 1,
                "title": a.title,
                "snippet": if a.snippet.is_empty() {
                    "No snippet provided. Focus on why the headline matters."
                } else {
                    a.snippet.as_str()
                },
                "source": a.source,
                "date": a.published_at,
            })
        })
        .collect();

    format!(
        "You will receive up to {} news search results as JSON.\n\
         For each story, write EXACTLY two sentences (40-60 words total) that \
         explain the key development and why it matters to readers.\n\
         Keep the order identical to the input.\n\n\
         Input articles:\n{}\n\n\
         Respond ONLY with valid JSON in this shape (no extra text, code \
         fences, or commentary):\n\
         [\n  {{\n    \"order\": 1,\n    \"summary\": \"Two-sentence summary here.\"\n  }}\n]",
        chunk.len(),
        serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "[]".to_string()),
    )
}

/// One bounded AI call for a chunk; any failure degrades to "no summaries".
async fn summarize_chunk(
    ai: &dyn AiClient,
    chunk: &[RawArticle],
    timeout: Duration,
) -> Vec<(usize, String)> {
    let prompt = chunk_prompt(chunk);
    let response = match tokio::time::timeout(timeout, ai.generate(&prompt)).await {
        Ok(Some(text)) => text,
        Ok(None) => return Vec::new(),
        Err(_) => {
            tracing::warn!(provider = ai.name(), "summarization call timed out");
            return Vec::new();
        }
    };

    extract_json_array(&response)
        .into_iter()
        .filter_map(|item| {
            let order = item.get("order").and_then(Value::as_u64)? as usize;
            let summary = item.get("summary").and_then(Value::as_str)?.trim().to_string();
            (!summary.is_empty()).then_some((order, summary))
        })
        .collect()
}

/// Summarize a list of fetched articles, batched to bound prompt size and
/// API call count. Output length always equals input length, order kept.
pub async fn summarize_articles(
    ai: &dyn AiClient,
    articles: &[RawArticle],
    cfg: &AppConfig,
) -> Vec<SummarizedArticle> {
    let mut out = Vec::with_capacity(articles.len());
    let chunks: Vec<&[RawArticle]> = articles.chunks(cfg.summary_chunk_size).collect();
    let total_chunks = chunks.len();

    for (ci, chunk) in chunks.into_iter().enumerate() {
        let by_order = summarize_chunk(ai, chunk, cfg.ai_timeout).await;

        for (i, article) in chunk.iter().enumerate() {
            let ai_summary = by_order
                .iter()
                .find(|(order, _)| *order == i + 1)
                .map(|(_, s)| s.as_str());
            let summary = resolve_display_text(
                &[
                    ("ai", ai_summary),
                    ("snippet", Some(article.snippet.as_str())),
                ],
                DEVELOPING_STORY_FALLBACK,
            );
            if ai_summary.is_none() {
                metrics::counter!("summarizer_fallbacks_total").increment(1);
            }
            out.push(SummarizedArticle {
                title: article.title.clone(),
                snippet: article.snippet.clone(),
                summary: summary.to_string(),
                source: article.source.clone(),
                url: article.url.clone(),
                image_url: article.image_url.clone(),
                published_at: article.published_at.clone(),
                category: article.category.clone(),
            });
        }

        // Pace sequential batches to respect upstream rate limits.
        if ci + 1 < total_chunks && !cfg.batch_pacing.is_zero() {
            tokio::time::sleep(cfg.batch_pacing).await;
        }
    }

    debug_assert_eq!(out.len(), articles.len());
    out
}

// ---------------------------------------------------------------------------
// Trend summarization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendSummary {
    pub topic: String,
    pub summary: String,
    pub interest_data: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

fn render_interest_data(data: Option<&Value>) -> String {
    let Some(data) = data else {
        return "Interest data not available".to_string();
    };
    // Prefer the timeline points when the payload has the expected shape.
    if let Some(points) = data
        .get("timeline_data")
        .or_else(|| data.get("default").and_then(|d| d.get("timelineData")))
        .and_then(Value::as_array)
    {
        let lines: Vec<String> = points
            .iter()
            .rev()
            .take(10)
            .rev()
            .map(|p| {
                let date = p
                    .get("date")
                    .or_else(|| p.get("formattedTime"))
                    .and_then(Value::as_str)
                    .unwrap_or("?");
                let value = p
                    .get("values")
                    .and_then(|v| v.get(0))
                    .and_then(|v| v.get("value"))
                    .or_else(|| p.get("value"))
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                format!("{date}: {value}")
            })
            .collect();
        if !lines.is_empty() {
            return lines.join("\n");
        }
    }
    // Char-wise cap: the payload may carry non-ASCII text and a byte-indexed
    // truncate can split a character.
    data.to_string().chars().take(500).collect()
}

fn trend_prompt(topic: &str, interest_data: Option<&Value>) -> String {
    format!(
        "You are a news writer. Based on the following trending topic and its \
         search interest data, create a short, clean news summary (2-3 \
         sentences maximum).\n\n\
         Trending Topic: {topic}\n\n\
         Interest Over Time Data:\n{}\n\n\
         Explain why this topic is trending, give context, keep a professional \
         news tone, and do not repeat the topic name. Return ONLY the summary \
         text, no labels or formatting.",
        render_interest_data(interest_data),
    )
}

fn clean_trend_summary(raw: &str) -> String {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("Summary:").or_else(|| s.strip_prefix("summary:")) {
        s = rest.trim();
    }
    s.trim_matches('"').trim().to_string()
}

/// Summarize one trend. Total: falls back to a fixed sentence on any failure.
pub async fn summarize_trend(
    ai: &dyn AiClient,
    topic: &str,
    interest_data: Option<&Value>,
    timeout: Duration,
) -> String {
    let prompt = trend_prompt(topic, interest_data);
    let generated = match tokio::time::timeout(timeout, ai.generate(&prompt)).await {
        Ok(Some(text)) => clean_trend_summary(&text),
        Ok(None) => String::new(),
        Err(_) => {
            tracing::warn!(topic, "trend summarization timed out");
            String::new()
        }
    };
    if generated.is_empty() {
        metrics::counter!("summarizer_fallbacks_total").increment(1);
        TRENDING_FALLBACK.to_string()
    } else {
        generated
    }
}

// ---------------------------------------------------------------------------
// Single-article analysis
// ---------------------------------------------------------------------------

fn analysis_fallback(title: &str, snippet: &str) -> String {
    let mut text = format!(
        "Analysis: {title}. This item covers a development worth monitoring; \
         its implications extend beyond the immediate details."
    );
    if !snippet.trim().is_empty() {
        text.push_str(&format!(" Article summary: {}", snippet.trim()));
    }
    text.push_str(
        " For AI-written analysis, configure the generative text service; \
         this is template text.",
    );
    text
}

/// Short reader-facing analysis of one article. Never empty, never an error.
pub async fn analyze_article(
    ai: &dyn AiClient,
    title: &str,
    snippet: &str,
    timeout: Duration,
) -> String {
    let prompt = format!(
        "Give a professional, reader-friendly analysis of around 50-100 words \
         of the following news article:\n\nTitle: {title}\n\nSnippet: {snippet}"
    );
    let generated = match tokio::time::timeout(timeout, ai.generate(&prompt)).await {
        Ok(Some(text)) => text.trim().to_string(),
        Ok(None) => String::new(),
        Err(_) => {
            tracing::warn!(title, "analysis call timed out");
            String::new()
        }
    };
    if generated.is_empty() {
        metrics::counter!("summarizer_fallbacks_total").increment(1);
        analysis_fallback(title, snippet)
    } else {
        generated
    }
}

// ---------------------------------------------------------------------------
// Editorial draft generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub tags: Vec<String>,
}

fn draft_fallback(topic: &str, category: &str) -> ArticleDraft {
    ArticleDraft {
        title: format!("Breaking News: {topic}"),
        content: format!(
            "{topic} has become a significant subject of discussion. This \
             article explores the background, the current state of \
             developments, and the outlook in the {category} category. As the \
             situation evolves it will be important to monitor it closely."
        ),
        summary: format!("An overview of {topic} in the {category} category."),
        tags: vec![
            category.to_lowercase(),
            topic.to_lowercase().replace(char::is_whitespace, "-"),
        ],
    }
}

/// Draft an article for the admin flow. Parses the model's JSON object
/// defensively; degrades to structured fallback content.
pub async fn draft_from_topic(
    ai: &dyn AiClient,
    topic: &str,
    category: &str,
    timeout: Duration,
) -> ArticleDraft {
    let prompt = format!(
        "Create a comprehensive news article about \"{topic}\". It should be \
         well-structured, informative, 500-800 words, professional in tone, \
         and end with a conclusion. Format the response as JSON with this \
         structure:\n\
         {{ \"title\": \"...\", \"content\": \"...\", \"summary\": \"...\", \
         \"tags\": [\"tag1\", \"tag2\"] }}"
    );
    let raw = match tokio::time::timeout(timeout, ai.generate(&prompt)).await {
        Ok(Some(text)) => text,
        _ => return draft_fallback(topic, category),
    };

    match extract_json_object(&raw) {
        Some(obj) => {
            let field = |k: &str| obj.get(k).and_then(Value::as_str).map(str::to_string);
            let tags = obj
                .get("tags")
                .and_then(Value::as_array)
                .map(|v| {
                    v.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| vec![category.to_lowercase()]);
            ArticleDraft {
                title: field("title").unwrap_or_else(|| format!("News Article: {topic}")),
                content: field("content").unwrap_or_else(|| raw.clone()),
                summary: field("summary")
                    .unwrap_or_else(|| format!("A comprehensive article about {topic}")),
                tags,
            }
        }
        // Model answered in prose: keep the text as content.
        None => ArticleDraft {
            title: format!("News Article: {topic}"),
            content: raw,
            summary: format!("A comprehensive article about {topic}"),
            tags: vec![category.to_lowercase(), topic.to_lowercase()],
        },
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Scripted client for tests: returns canned responses in order, then `None`.
pub struct MockAiClient {
    responses: std::sync::Mutex<std::collections::VecDeque<Option<String>>>,
    pub calls: std::sync::atomic::AtomicUsize,
}

impl MockAiClient {
    pub fn new(responses: Vec<Option<String>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Client that always fails, like a dead upstream.
    pub fn always_failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl AiClient for MockAiClient {
    async fn generate(&self, _prompt: &str) -> Option<String> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.responses
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .flatten()
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}
