// tests/common/mod.rs
//
// Shared fixtures for router-level tests: scripted upstream providers and a
// fully in-memory application state. No sockets, no real upstreams.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt as _; // for `oneshot`

use newsdesk::api::AppState;
use newsdesk::auth;
use newsdesk::cache::{CacheEntry, CacheStore, MemoryCacheStore};
use newsdesk::config::AppConfig;
use newsdesk::fetch::{FetchError, NewsProvider, RawArticle, TrendsProvider};
use newsdesk::store::{
    ArticleRepo, ArticleStatus, MemoryDb, Role, StoredArticle, User, UserRepo,
};
use newsdesk::summarize::MockAiClient;

pub const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

// ---------------------------------------------------------------------------
// Scripted upstream providers
// ---------------------------------------------------------------------------

/// News provider returning a fixed result set and counting calls.
pub struct ScriptedNews {
    pub articles: Vec<RawArticle>,
    pub fail_upstream: bool,
    pub calls: AtomicUsize,
}

impl ScriptedNews {
    pub fn returning(articles: Vec<RawArticle>) -> Self {
        Self {
            articles,
            fail_upstream: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            articles: Vec::new(),
            fail_upstream: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsProvider for ScriptedNews {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<RawArticle>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_upstream {
            return Err(FetchError::Upstream {
                status: 503,
                message: "quota exhausted".to_string(),
            });
        }
        Ok(self.articles.iter().take(limit).cloned().collect())
    }
    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Trends provider returning fixed topics and one interest payload.
pub struct ScriptedTrends {
    pub topics: Vec<String>,
    pub interest: Option<Value>,
    pub trending_calls: AtomicUsize,
    pub interest_calls: AtomicUsize,
}

impl ScriptedTrends {
    pub fn returning(topics: Vec<String>, interest: Option<Value>) -> Self {
        Self {
            topics,
            interest,
            trending_calls: AtomicUsize::new(0),
            interest_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TrendsProvider for ScriptedTrends {
    async fn trending(&self, _geo: &str) -> Result<Vec<String>, FetchError> {
        self.trending_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.topics.clone())
    }
    async fn interest_over_time(&self, _topic: &str) -> Result<Option<Value>, FetchError> {
        self.interest_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.interest.clone())
    }
    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Cache store whose every operation errors, like an unreachable backend.
pub struct FailingCacheStore;

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _key: &str) -> anyhow::Result<Option<CacheEntry>> {
        Err(anyhow::anyhow!("cache backend unreachable"))
    }
    async fn put(
        &self,
        _key: &str,
        _payload: Value,
        _ttl: std::time::Duration,
    ) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("cache backend unreachable"))
    }
    async fn delete(&self, _key: &str) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("cache backend unreachable"))
    }
}

// ---------------------------------------------------------------------------
// Application fixture
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub state: AppState,
    pub news: Arc<ScriptedNews>,
    pub trends: Arc<ScriptedTrends>,
    pub ai: Arc<MockAiClient>,
}

impl TestApp {
    /// Dead upstreams everywhere: no news, no trends, AI always failing.
    pub fn bare() -> Self {
        Self::build(
            ScriptedNews::returning(Vec::new()),
            ScriptedTrends::returning(Vec::new(), None),
            MockAiClient::always_failing(),
        )
    }

    pub fn build(news: ScriptedNews, trends: ScriptedTrends, ai: MockAiClient) -> Self {
        let db = Arc::new(MemoryDb::new());
        let news = Arc::new(news);
        let trends = Arc::new(trends);
        let ai = Arc::new(ai);
        let state = AppState {
            config: Arc::new(AppConfig::for_tests()),
            cache: Arc::new(MemoryCacheStore::new()),
            articles: db.clone(),
            comments: db.clone(),
            users: db,
            news: news.clone(),
            trends: trends.clone(),
            ai: ai.clone(),
        };
        Self {
            state,
            news,
            trends,
            ai,
        }
    }

    /// Build the same Router the binary uses.
    pub fn router(&self) -> Router {
        newsdesk::router(self.state.clone())
    }

    /// Seed an active admin account and return a valid bearer token for it.
    pub async fn admin_token(&self) -> String {
        self.seeded_token("u-admin", "admin", Role::Admin).await
    }

    /// Seed an active non-admin account and return its token (403 paths).
    pub async fn reader_token(&self) -> String {
        self.seeded_token("u-reader", "reader", Role::Reader).await
    }

    async fn seeded_token(&self, id: &str, username: &str, role: Role) -> String {
        let user = User {
            id: id.to_string(),
            username: username.to_string(),
            password_digest: auth::hash_password("letmein"),
            role,
            active: true,
        };
        let user = self.state.users.insert(user).await.expect("seed user");
        let secret = self.state.config.jwt_secret.as_deref().expect("jwt secret");
        auth::issue_token(secret, &user).expect("issue token")
    }

    /// Seed a published manual article with the given title/summary.
    pub async fn seed_published(&self, id: &str, title: &str, summary: &str) -> StoredArticle {
        self.state
            .articles
            .insert(published_article(id, title, summary))
            .await
            .expect("seed article")
    }
}

pub fn raw_article(n: usize) -> RawArticle {
    RawArticle {
        title: format!("Headline {n}"),
        snippet: format!("Snippet for story {n}."),
        source: "Example Wire".to_string(),
        url: format!("https://news.example.com/{n}"),
        image_url: None,
        published_at: Some("2026-08-01".to_string()),
        category: "General".to_string(),
    }
}

pub fn published_article(id: &str, title: &str, summary: &str) -> StoredArticle {
    StoredArticle {
        id: id.to_string(),
        title: title.to_string(),
        content: format!("{summary} Full body text."),
        summary: summary.to_string(),
        author: "editor".to_string(),
        status: ArticleStatus::Published,
        tags: vec!["manual".to_string()],
        category: "General".to_string(),
        published_at: Some(Utc::now()),
        created_at: Utc::now(),
        views: 0,
        likes: 0,
        is_featured: false,
        source: "Editorial".to_string(),
        external_url: None,
        image_url: None,
    }
}

// ---------------------------------------------------------------------------
// Request plumbing
// ---------------------------------------------------------------------------

pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    json: Option<&Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header("authorization", format!("Bearer {t}"));
    }
    let body = match json {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("build request")
}

/// Run one request through the router, returning status + parsed JSON body.
/// Non-JSON bodies come back as a JSON string.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let parsed = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, parsed)
}
