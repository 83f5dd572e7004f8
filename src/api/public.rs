// src/api/public.rs
//! Public reader surface: published articles, comments, likes, categories.
//! No authentication; comments land unapproved and wait for moderation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::error::ApiError;
use crate::store::{ArticleFilter, ArticleStatus, Comment, Page, StoredArticle};

fn article_not_found() -> ApiError {
    ApiError::NotFound("Article not found or not published".to_string())
}

/// List view omits the full content body.
fn list_view(a: &StoredArticle) -> Value {
    json!({
        "id": a.id,
        "title": a.title,
        "summary": a.summary,
        "author": a.author,
        "category": a.category,
        "tags": a.tags,
        "published_at": a.published_at,
        "views": a.views,
        "likes": a.likes,
        "is_featured": a.is_featured,
        "source": a.source,
        "external_url": a.external_url,
        "image_url": a.image_url,
    })
}

async fn published_article(state: &AppState, id: &str) -> Result<StoredArticle, ApiError> {
    state
        .articles
        .get(id)
        .await?
        .filter(|a| a.status == ArticleStatus::Published)
        .ok_or_else(article_not_found)
}

// ---------------------------------------------------------------------------
// GET /public/news
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    search: Option<String>,
}

pub async fn list_news(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = Page {
        number: params.page.unwrap_or(1).max(1),
        size: params.limit.unwrap_or(10).clamp(1, 50),
    };
    let filter = ArticleFilter {
        status: Some(ArticleStatus::Published),
        category: params.category.filter(|c| !c.trim().is_empty()),
        search: params.search.filter(|s| !s.trim().is_empty()),
        featured_only: false,
    };
    let (rows, total) = state.articles.list(&filter, &page).await?;
    Ok(Json(json!({
        "articles": rows.iter().map(list_view).collect::<Vec<_>>(),
        "total": total,
        "totalPages": total.div_ceil(page.size),
        "currentPage": page.number,
    })))
}

pub async fn featured_news(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let filter = ArticleFilter {
        status: Some(ArticleStatus::Published),
        featured_only: true,
        ..Default::default()
    };
    let (rows, _) = state
        .articles
        .list(&filter, &Page { number: 1, size: 5 })
        .await?;
    Ok(Json(json!({
        "articles": rows.iter().map(list_view).collect::<Vec<_>>(),
    })))
}

// ---------------------------------------------------------------------------
// GET /public/news/{id}
// ---------------------------------------------------------------------------

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut article = published_article(&state, &id).await?;
    if let Some(views) = state.articles.increment_views(&id).await? {
        article.views = views;
    }
    let comments = state.comments.list_for_article(&id, true).await?;
    Ok(Json(json!({
        "article": article,
        "comments": comments,
    })))
}

// ---------------------------------------------------------------------------
// POST /public/news/{id}/comments
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    content: String,
    #[serde(default)]
    author: CommentAuthor,
}

#[derive(Deserialize, Default)]
pub struct CommentAuthor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CommentBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    published_article(&state, &id).await?;
    if body.content.trim().is_empty()
        || body.author.name.trim().is_empty()
        || body.author.email.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "Content and author information are required".to_string(),
        ));
    }

    let comment = state
        .comments
        .insert(Comment {
            id: new_comment_id(),
            article_id: id,
            content: body.content.trim().to_string(),
            author_name: body.author.name.trim().to_string(),
            author_email: body.author.email.trim().to_string(),
            // Moderation gate: nothing is public until approved.
            approved: false,
            created_at: Utc::now(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Comment submitted successfully. It will be reviewed before being published.",
            "comment": {
                "id": comment.id,
                "content": comment.content,
                "author": { "name": comment.author_name, "email": comment.author_email },
                "created_at": comment.created_at,
            },
        })),
    ))
}

fn new_comment_id() -> String {
    use rand::Rng;
    let n: u64 = rand::thread_rng().gen();
    format!("c{n:016x}")
}

// ---------------------------------------------------------------------------
// POST /public/news/{id}/like
// ---------------------------------------------------------------------------

pub async fn like_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    published_article(&state, &id).await?;
    let likes = state
        .articles
        .increment_likes(&id)
        .await?
        .ok_or_else(article_not_found)?;
    Ok(Json(json!({
        "message": "Article liked successfully",
        "likes": likes,
    })))
}

pub async fn categories(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let cats = state.articles.categories().await?;
    Ok(Json(json!({ "categories": cats })))
}
