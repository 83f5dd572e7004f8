// src/api/news.rs
//! Cache-aware aggregation endpoints: the news feed, per-article analysis,
//! and the trending feed.
//!
//! Each handler runs the same state machine: compute key, look the cache
//! up, return a hit annotated `cached: true`, otherwise fetch + summarize +
//! merge, write the result back under a fixed TTL, and return it annotated
//! `cached: false`. The cache is an optimization only — store failures
//! degrade to a miss and never fail the request.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::cache::{lookup_live, request_key, store_result};
use crate::error::ApiError;
use crate::merge::{merge_articles, merge_trends};
use crate::store::{ArticleFilter, ArticleStatus, Page, StoredArticle};
use crate::summarize::{analyze_article, summarize_articles, summarize_trend, TrendSummary};

const MAX_LIMIT: usize = 50;
const DEFAULT_LIMIT: usize = 10;

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn with_cached_flag(mut payload: Value, cached: bool) -> Value {
    payload["cached"] = json!(cached);
    payload
}

async fn published_manual(
    state: &AppState,
    size: usize,
) -> Result<Vec<StoredArticle>, ApiError> {
    let filter = ArticleFilter {
        status: Some(ArticleStatus::Published),
        ..Default::default()
    };
    let (rows, _) = state
        .articles
        .list(&filter, &Page { number: 1, size })
        .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// GET /news
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct NewsQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

pub async fn get_news(
    State(state): State<AppState>,
    Query(params): Query<NewsQuery>,
) -> Result<Json<Value>, ApiError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or("top news")
        .to_string();
    let limit = clamp_limit(params.limit);

    let key = request_key(&["news", &query, &limit.to_string()]);
    if let Some(hit) = lookup_live(state.cache.as_ref(), &key).await {
        tracing::debug!(%query, key = %key, "news cache hit");
        return Ok(Json(with_cached_flag(hit, true)));
    }

    let fetched = state.news.search(&query, limit).await.map_err(|e| {
        metrics::counter!("fetch_errors_total").increment(1);
        tracing::warn!(error = %e, %query, "news fetch failed");
        ApiError::from(e)
    })?;
    if fetched.is_empty() {
        return Err(ApiError::Empty(format!("No articles found for '{query}'")));
    }

    let summarized = summarize_articles(state.ai.as_ref(), &fetched, &state.config).await;
    let manual = published_manual(&state, limit).await?;
    let feed = merge_articles(&manual, summarized);

    let payload = json!({
        "success": true,
        "query": query,
        "timestamp": Utc::now(),
        "articles": feed.articles,
        "count": feed.manual_count + feed.api_count,
        "manualCount": feed.manual_count,
        "apiCount": feed.api_count,
    });
    store_result(state.cache.as_ref(), &key, &payload, state.config.cache_ttl).await;
    Ok(Json(with_cached_flag(payload, false)))
}

// ---------------------------------------------------------------------------
// POST /analysis
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AnalysisBody {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

pub async fn post_analysis(
    State(state): State<AppState>,
    Json(body): Json<AnalysisBody>,
) -> Result<Json<Value>, ApiError> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation(
            "Missing article title for analysis.".to_string(),
        ));
    }

    let key = request_key(&["analysis", title, &body.snippet]);
    if let Some(hit) = lookup_live(state.cache.as_ref(), &key).await {
        tracing::debug!(title, "analysis cache hit");
        return Ok(Json(with_cached_flag(hit, true)));
    }

    let analysis =
        analyze_article(state.ai.as_ref(), title, &body.snippet, state.config.ai_timeout).await;

    let payload = json!({ "analysis": analysis });
    store_result(state.cache.as_ref(), &key, &payload, state.config.cache_ttl).await;
    Ok(Json(with_cached_flag(payload, false)))
}

// ---------------------------------------------------------------------------
// GET /trending
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct TrendingQuery {
    #[serde(default)]
    geo: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

pub async fn get_trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingQuery>,
) -> Result<Json<Value>, ApiError> {
    let geo = params
        .geo
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .unwrap_or("IN")
        .to_uppercase();
    let limit = clamp_limit(params.limit);

    let key = request_key(&["trending", &geo, &limit.to_string()]);
    if let Some(hit) = lookup_live(state.cache.as_ref(), &key).await {
        tracing::debug!(%geo, "trending cache hit");
        return Ok(Json(with_cached_flag(hit, true)));
    }

    let topics = state.trends.trending(&geo).await.map_err(|e| {
        metrics::counter!("fetch_errors_total").increment(1);
        tracing::warn!(error = %e, %geo, "trends fetch failed");
        ApiError::from(e)
    })?;
    if topics.is_empty() {
        return Err(ApiError::Empty("No trending searches found".to_string()));
    }
    let top: Vec<String> = topics.iter().take(limit).cloned().collect();

    let mut summaries: Vec<TrendSummary> = Vec::with_capacity(top.len());
    for (i, topic) in top.iter().enumerate() {
        // A failed interest fetch degrades to "no data"; the trend still ships.
        let interest = match state.trends.interest_over_time(topic).await {
            Ok(data) => data,
            Err(e) => {
                metrics::counter!("fetch_errors_total").increment(1);
                tracing::warn!(error = %e, topic, "interest-over-time fetch failed");
                None
            }
        };
        let summary = summarize_trend(
            state.ai.as_ref(),
            topic,
            interest.as_ref(),
            state.config.ai_timeout,
        )
        .await;
        summaries.push(TrendSummary {
            topic: topic.clone(),
            summary,
            interest_data: interest,
            timestamp: Utc::now(),
        });
        // Pace sequential per-topic calls to stay under the rate limit.
        if i + 1 < top.len() && !state.config.trend_pacing.is_zero() {
            tokio::time::sleep(state.config.trend_pacing).await;
        }
    }

    let manual = published_manual(&state, MAX_LIMIT).await?;
    let feed = merge_trends(&top, summaries, &manual);

    let payload = json!({
        "success": true,
        "geo": geo,
        "timestamp": Utc::now(),
        "trends": feed.trends,
        "count": feed.trends.len(),
        "manualCount": feed.manual_count,
        "aiCount": feed.ai_count,
    });
    store_result(state.cache.as_ref(), &key, &payload, state.config.cache_ttl).await;
    Ok(Json(with_cached_flag(payload, false)))
}
