// src/api/mod.rs
//! Router assembly and shared request state.

pub mod admin;
pub mod news;
pub mod public;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::auth;
use crate::cache::{CacheStore, MemoryCacheStore};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::fetch::{NewsProvider, SerpApiClient, TrendsProvider, UnconfiguredProvider};
use crate::store::{ArticleRepo, CommentRepo, MemoryDb, User, UserRepo};
use crate::summarize::{build_ai_client, AiClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: Arc<dyn CacheStore>,
    pub articles: Arc<dyn ArticleRepo>,
    pub comments: Arc<dyn CommentRepo>,
    pub users: Arc<dyn UserRepo>,
    pub news: Arc<dyn NewsProvider>,
    pub trends: Arc<dyn TrendsProvider>,
    pub ai: Arc<dyn AiClient>,
}

impl AppState {
    /// Wire the production state from config: SerpAPI + Gemini when keyed,
    /// tagged unconfigured/disabled stand-ins otherwise.
    pub fn from_config(config: AppConfig) -> Self {
        if let Some(url) = &config.database_url {
            tracing::warn!(
                url_len = url.len(),
                "DATABASE_URL is set but this build ships the in-memory store"
            );
        }
        let db = Arc::new(MemoryDb::new());
        let (news, trends): (Arc<dyn NewsProvider>, Arc<dyn TrendsProvider>) =
            match &config.serpapi_key {
                Some(key) => {
                    let client = Arc::new(SerpApiClient::new(key.clone()));
                    (client.clone(), client)
                }
                None => {
                    tracing::warn!("SERPAPI_KEY absent; news and trends endpoints will return 500");
                    let stub = Arc::new(UnconfiguredProvider);
                    (stub.clone(), stub)
                }
            };
        let ai = build_ai_client(&config);
        Self {
            config: Arc::new(config),
            cache: Arc::new(MemoryCacheStore::new()),
            articles: db.clone(),
            comments: db.clone(),
            users: db,
            news,
            trends,
            ai,
        }
    }
}

/// Extractor gating the `/admin` surface: resolves the bearer token to an
/// active admin user or rejects with 401/403.
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = auth::authenticate_admin(
            state.users.as_ref(),
            state.config.jwt_secret.as_deref(),
            &parts.headers,
        )
        .await?;
        Ok(AdminUser(user))
    }
}

#[derive(Deserialize)]
struct LoginBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn post_login(
    axum::extract::State(state): axum::extract::State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password are required.".to_string(),
        ));
    }
    let token = auth::login(
        state.users.as_ref(),
        state.config.jwt_secret.as_deref(),
        body.username.trim(),
        &body.password,
    )
    .await?;
    Ok(Json(json!({ "token": token })))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // Aggregated feeds
        .route("/news", get(news::get_news))
        .route("/analysis", post(news::post_analysis))
        .route("/trending", get(news::get_trending))
        // Auth
        .route("/auth/login", post(post_login))
        // Public reader surface
        .route("/public/news", get(public::list_news))
        .route("/public/news/featured", get(public::featured_news))
        .route("/public/news/{id}", get(public::get_article))
        .route("/public/news/{id}/comments", post(public::add_comment))
        .route("/public/news/{id}/like", post(public::like_article))
        .route("/public/categories", get(public::categories))
        // Admin surface (bearer token, admin role)
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/news", get(admin::list_news).post(admin::create_news))
        .route("/admin/news/generate", post(admin::generate_news))
        .route(
            "/admin/news/publish-external",
            post(admin::publish_external),
        )
        .route(
            "/admin/news/{id}",
            get(admin::get_news)
                .put(admin::update_news)
                .delete(admin::delete_news),
        )
        .route("/admin/news/{id}/publish", patch(admin::publish_news))
        .route("/admin/comments", get(admin::list_comments))
        .route(
            "/admin/comments/{id}/moderate",
            patch(admin::moderate_comment),
        )
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
