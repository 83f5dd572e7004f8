// src/api/admin.rs
//! Admin surface: dashboard, article CRUD + publishing, AI drafting, and
//! comment moderation. Every handler is gated by the [`AdminUser`]
//! extractor (401 without a valid token, 403 without the admin role).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AdminUser, AppState};
use crate::error::ApiError;
use crate::store::{
    ArticleFilter, ArticleStatus, ArticleUpdate, Page, StoredArticle,
};
use crate::summarize::draft_from_topic;

fn article_not_found() -> ApiError {
    ApiError::NotFound("Article not found".to_string())
}

fn parse_status(raw: Option<&str>) -> Option<ArticleStatus> {
    match raw?.to_ascii_lowercase().as_str() {
        "draft" => Some(ArticleStatus::Draft),
        "published" => Some(ArticleStatus::Published),
        "archived" => Some(ArticleStatus::Archived),
        _ => None,
    }
}

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    approved: Option<bool>,
}

impl PageQuery {
    fn page(&self) -> Page {
        Page {
            number: self.page.unwrap_or(1).max(1),
            size: self.limit.unwrap_or(10).clamp(1, 100),
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

pub async fn dashboard(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let all = ArticleFilter::default();
    let published = ArticleFilter {
        status: Some(ArticleStatus::Published),
        ..Default::default()
    };
    let drafts = ArticleFilter {
        status: Some(ArticleStatus::Draft),
        ..Default::default()
    };

    let total_articles = state.articles.count(&all).await?;
    let published_articles = state.articles.count(&published).await?;
    let draft_articles = state.articles.count(&drafts).await?;
    let total_comments = state.comments.count(None).await?;
    let pending_comments = state.comments.count(Some(false)).await?;
    let (recent, _) = state
        .articles
        .list(&all, &Page { number: 1, size: 5 })
        .await?;

    Ok(Json(json!({
        "stats": {
            "totalArticles": total_articles,
            "publishedArticles": published_articles,
            "draftArticles": draft_articles,
            "totalComments": total_comments,
            "pendingComments": pending_comments,
        },
        "recentArticles": recent,
    })))
}

// ---------------------------------------------------------------------------
// Article CRUD
// ---------------------------------------------------------------------------

pub async fn list_news(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = params.page();
    let filter = ArticleFilter {
        status: parse_status(params.status.as_deref()),
        ..Default::default()
    };
    let (rows, total) = state.articles.list(&filter, &page).await?;
    Ok(Json(json!({
        "articles": rows,
        "total": total,
        "totalPages": total.div_ceil(page.size),
        "currentPage": page.number,
    })))
}

pub async fn get_news(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let article = state.articles.get(&id).await?.ok_or_else(article_not_found)?;
    Ok(Json(json!({ "article": article })))
}

#[derive(Deserialize)]
pub struct CreateBody {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    image_url: Option<String>,
}

pub async fn create_news(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if body.title.trim().is_empty() || body.content.trim().is_empty() {
        return Err(ApiError::Validation(
            "Title and content are required".to_string(),
        ));
    }
    let category = body.category.unwrap_or_else(|| "General".to_string());
    let article = state
        .articles
        .insert(StoredArticle {
            id: new_article_id(),
            title: body.title.trim().to_string(),
            content: body.content,
            summary: if body.summary.trim().is_empty() {
                body.title.trim().to_string()
            } else {
                body.summary.trim().to_string()
            },
            author: admin.username,
            status: ArticleStatus::Draft,
            tags: body.tags,
            category,
            published_at: None,
            created_at: Utc::now(),
            views: 0,
            likes: 0,
            is_featured: false,
            source: "Editorial".to_string(),
            external_url: None,
            image_url: body.image_url,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Article created", "article": article })),
    ))
}

pub async fn update_news(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ArticleUpdate>,
) -> Result<Json<Value>, ApiError> {
    let article = state
        .articles
        .update(&id, update)
        .await?
        .ok_or_else(article_not_found)?;
    Ok(Json(json!({
        "message": "Article updated successfully",
        "article": article,
    })))
}

pub async fn publish_news(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let article = state
        .articles
        .publish(&id)
        .await?
        .ok_or_else(article_not_found)?;
    Ok(Json(json!({
        "message": "Article published successfully",
        "article": article,
    })))
}

pub async fn delete_news(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !state.articles.delete(&id).await? {
        return Err(article_not_found());
    }
    // Orphaned comments go with the article.
    let removed = state.comments.delete_for_article(&id).await?;
    tracing::info!(article_id = %id, comments_removed = removed, "article deleted");
    Ok(Json(json!({ "message": "Article deleted successfully" })))
}

fn new_article_id() -> String {
    use rand::Rng;
    let n: u64 = rand::thread_rng().gen();
    format!("a{n:016x}")
}

// ---------------------------------------------------------------------------
// AI drafting + external publishing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    category: Option<String>,
}

pub async fn generate_news(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<Value>, ApiError> {
    let topic = body.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::Validation("Topic is required".to_string()));
    }
    let category = body.category.unwrap_or_else(|| "General".to_string());

    let draft = draft_from_topic(state.ai.as_ref(), topic, &category, state.config.ai_timeout).await;
    let article = state
        .articles
        .insert(StoredArticle {
            id: new_article_id(),
            title: draft.title,
            content: draft.content,
            summary: draft.summary,
            author: admin.username,
            status: ArticleStatus::Draft,
            tags: draft.tags,
            category,
            published_at: None,
            created_at: Utc::now(),
            views: 0,
            likes: 0,
            is_featured: false,
            source: "Admin Generated".to_string(),
            external_url: None,
            image_url: None,
        })
        .await?;

    Ok(Json(json!({
        "message": "News article generated successfully",
        "article": article,
    })))
}

#[derive(Deserialize)]
pub struct PublishExternalBody {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

/// Persist an externally fetched article as a published manual article, so
/// it joins the merged feed permanently.
pub async fn publish_external(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(body): Json<PublishExternalBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if body.title.trim().is_empty() || body.snippet.trim().is_empty() {
        return Err(ApiError::Validation(
            "Title and snippet are required".to_string(),
        ));
    }
    let category = body.category.unwrap_or_else(|| "General".to_string());
    let article = state
        .articles
        .insert(StoredArticle {
            id: new_article_id(),
            title: body.title.trim().to_string(),
            content: body.snippet.clone(),
            summary: body.snippet,
            author: admin.username,
            status: ArticleStatus::Published,
            tags: vec![category.to_lowercase(), "external-news".to_string()],
            category,
            published_at: Some(Utc::now()),
            created_at: Utc::now(),
            views: 0,
            likes: 0,
            is_featured: false,
            source: "External News API".to_string(),
            external_url: body.url,
            image_url: body.image_url,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "External news article published successfully",
            "article": article,
        })),
    ))
}

// ---------------------------------------------------------------------------
// Comment moderation
// ---------------------------------------------------------------------------

pub async fn list_comments(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = params.page();
    let (rows, total) = state.comments.list(params.approved, &page).await?;
    Ok(Json(json!({
        "comments": rows,
        "total": total,
        "totalPages": total.div_ceil(page.size),
        "currentPage": page.number,
    })))
}

#[derive(Deserialize)]
pub struct ModerateBody {
    approved: bool,
}

pub async fn moderate_comment(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ModerateBody>,
) -> Result<Json<Value>, ApiError> {
    let comment = state
        .comments
        .set_approved(&id, body.approved)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;
    let verdict = if body.approved { "approved" } else { "rejected" };
    Ok(Json(json!({
        "message": format!("Comment {verdict} successfully"),
        "comment": comment,
    })))
}
