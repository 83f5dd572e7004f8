// src/merge.rs
//! Merge pipelines: stitch AI-summarized external content together with
//! locally stored manual articles into one response.
//!
//! Display-text precedence is an explicit ordered list of named strategies,
//! first usable value wins. The order is part of the contract and tested.

use chrono::Utc;
use serde::Serialize;

use crate::store::StoredArticle;
use crate::summarize::{SummarizedArticle, TrendSummary};

/// Walk named candidates in order; a candidate is usable when it is `Some`
/// and non-blank. Returns the fallback when nothing is usable.
pub fn resolve_display_text<'a>(
    strategies: &[(&'static str, Option<&'a str>)],
    fallback: &'a str,
) -> &'a str {
    resolve_named(strategies).map(|(_, text)| text).unwrap_or(fallback)
}

/// Like [`resolve_display_text`] but reports which strategy won.
pub fn resolve_named<'a>(
    strategies: &[(&'static str, Option<&'a str>)],
) -> Option<(&'static str, &'a str)> {
    strategies.iter().find_map(|(name, candidate)| {
        candidate
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| (*name, s))
    })
}

// ---------------------------------------------------------------------------
// Article feed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedArticle {
    pub title: String,
    pub summary: String,
    pub snippet: String,
    pub source: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub category: String,
    pub is_manual: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleFeed {
    pub articles: Vec<FeedArticle>,
    pub manual_count: usize,
    pub api_count: usize,
}

fn manual_to_feed(a: &StoredArticle) -> FeedArticle {
    FeedArticle {
        title: a.title.clone(),
        summary: a.summary.clone(),
        snippet: a.summary.clone(),
        source: a.source.clone(),
        url: a.external_url.clone(),
        image_url: a.image_url.clone(),
        published_at: a.published_at.map(|t| t.to_rfc3339()),
        category: a.category.clone(),
        is_manual: true,
        id: Some(a.id.clone()),
    }
}

fn external_to_feed(a: SummarizedArticle) -> FeedArticle {
    FeedArticle {
        title: a.title,
        summary: a.summary,
        snippet: a.snippet,
        source: a.source,
        url: Some(a.url),
        image_url: a.image_url,
        published_at: a.published_at,
        category: a.category,
        is_manual: false,
        id: None,
    }
}

/// Manual-first concatenation, no de-duplication; ordering within each
/// sublist is preserved from its source. `manual_count + api_count` always
/// equals the total.
pub fn merge_articles(manual: &[StoredArticle], external: Vec<SummarizedArticle>) -> ArticleFeed {
    let manual_count = manual.len();
    let api_count = external.len();
    let mut articles: Vec<FeedArticle> = manual.iter().map(manual_to_feed).collect();
    articles.extend(external.into_iter().map(external_to_feed));
    ArticleFeed {
        articles,
        manual_count,
        api_count,
    }
}

// ---------------------------------------------------------------------------
// Trend feed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendRecord {
    pub topic: String,
    pub summary: String,
    pub is_manual: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_data: Option<serde_json::Value>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendFeed {
    pub trends: Vec<TrendRecord>,
    pub manual_count: usize,
    pub ai_count: usize,
}

/// Case-insensitive substring containment of the topic across title,
/// summary, tags, and category. First match in query-result order wins.
fn find_manual_match<'a>(topic: &str, manual: &'a [StoredArticle]) -> Option<&'a StoredArticle> {
    let needle = topic.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    manual.iter().find(|a| {
        a.title.to_lowercase().contains(&needle)
            || a.summary.to_lowercase().contains(&needle)
            || a.category.to_lowercase().contains(&needle)
            || a.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    })
}

/// Merge AI trend summaries with manual-article matches. One record per AI
/// trend (manual fields win when matched, AI fields otherwise); topics from
/// the full ranked list that received no AI summary but do have a manual
/// match are appended after.
pub fn merge_trends(
    topics: &[String],
    ai_trends: Vec<TrendSummary>,
    manual: &[StoredArticle],
) -> TrendFeed {
    let ai_count = ai_trends.len();
    let summarized: Vec<String> = ai_trends.iter().map(|t| t.topic.to_lowercase()).collect();
    let mut matched_ids: Vec<String> = Vec::new();
    let mut trends: Vec<TrendRecord> = Vec::with_capacity(ai_count);

    for trend in ai_trends {
        match find_manual_match(&trend.topic, manual) {
            Some(article) => {
                matched_ids.push(article.id.clone());
                let summary = resolve_display_text(
                    &[
                        ("manual", Some(article.summary.as_str())),
                        ("ai", Some(trend.summary.as_str())),
                    ],
                    crate::summarize::TRENDING_FALLBACK,
                )
                .to_string();
                trends.push(TrendRecord {
                    topic: trend.topic,
                    summary,
                    is_manual: true,
                    article_id: Some(article.id.clone()),
                    image_url: article.image_url.clone(),
                    interest_data: trend.interest_data,
                    timestamp: trend.timestamp,
                });
            }
            None => trends.push(TrendRecord {
                topic: trend.topic,
                summary: trend.summary,
                is_manual: false,
                article_id: None,
                image_url: None,
                interest_data: trend.interest_data,
                timestamp: trend.timestamp,
            }),
        }
    }

    // Ranked topics the summarizer never covered still surface when an
    // editor has written about them.
    for topic in topics {
        if summarized.contains(&topic.to_lowercase()) {
            continue;
        }
        if let Some(article) = find_manual_match(topic, manual) {
            if matched_ids.contains(&article.id) {
                continue;
            }
            matched_ids.push(article.id.clone());
            trends.push(TrendRecord {
                topic: topic.clone(),
                summary: article.summary.clone(),
                is_manual: true,
                article_id: Some(article.id.clone()),
                image_url: article.image_url.clone(),
                interest_data: None,
                timestamp: Utc::now(),
            });
        }
    }

    let manual_count = matched_ids.len();
    TrendFeed {
        trends,
        manual_count,
        ai_count,
    }
}
