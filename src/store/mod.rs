// src/store/mod.rs
//! Primary document store for manual articles, comments, and users.
//!
//! The document database itself is an external collaborator; these traits
//! are the seam it plugs into. The in-memory implementation below backs
//! local runs and tests, and mirrors the upsert/filter semantics a document
//! store would provide.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub author: String,
    pub status: ArticleStatus,
    pub tags: Vec<String>,
    pub category: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub views: u64,
    pub likes: u64,
    pub is_featured: bool,
    pub source: String,
    pub external_url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub article_id: String,
    pub content: String,
    pub author_name: String,
    pub author_email: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Reader,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_digest: String,
    pub role: Role,
    pub active: bool,
}

/// List filters for the admin/public article views.
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub status: Option<ArticleStatus>,
    pub category: Option<String>,
    /// Case-insensitive substring over title, summary, and tags.
    pub search: Option<String>,
    pub featured_only: bool,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { number: 1, size: 10 }
    }
}

/// Mutable fields accepted by the admin update endpoint. `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub image_url: Option<String>,
}

#[async_trait]
pub trait ArticleRepo: Send + Sync {
    async fn insert(&self, article: StoredArticle) -> Result<StoredArticle>;
    async fn get(&self, id: &str) -> Result<Option<StoredArticle>>;
    /// Newest-first (published_at for published, created_at otherwise).
    async fn list(&self, filter: &ArticleFilter, page: &Page) -> Result<(Vec<StoredArticle>, usize)>;
    async fn update(&self, id: &str, update: ArticleUpdate) -> Result<Option<StoredArticle>>;
    async fn publish(&self, id: &str) -> Result<Option<StoredArticle>>;
    async fn delete(&self, id: &str) -> Result<bool>;
    async fn increment_views(&self, id: &str) -> Result<Option<u64>>;
    async fn increment_likes(&self, id: &str) -> Result<Option<u64>>;
    async fn categories(&self) -> Result<Vec<String>>;
    async fn count(&self, filter: &ArticleFilter) -> Result<usize>;
}

#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn insert(&self, comment: Comment) -> Result<Comment>;
    async fn get(&self, id: &str) -> Result<Option<Comment>>;
    /// Newest-first; `approved = None` lists everything.
    async fn list(&self, approved: Option<bool>, page: &Page) -> Result<(Vec<Comment>, usize)>;
    async fn list_for_article(&self, article_id: &str, approved_only: bool) -> Result<Vec<Comment>>;
    async fn set_approved(&self, id: &str, approved: bool) -> Result<Option<Comment>>;
    async fn delete_for_article(&self, article_id: &str) -> Result<usize>;
    async fn count(&self, approved: Option<bool>) -> Result<usize>;
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn insert(&self, user: User) -> Result<User>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>>;
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryDb {
    articles: RwLock<HashMap<String, StoredArticle>>,
    comments: RwLock<HashMap<String, Comment>>,
    users: RwLock<HashMap<String, User>>,
    next_id: AtomicU64,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{n:08x}")
    }
}

fn poisoned() -> anyhow::Error {
    anyhow!("store lock poisoned")
}

fn matches_filter(a: &StoredArticle, filter: &ArticleFilter) -> bool {
    if let Some(status) = filter.status {
        if a.status != status {
            return false;
        }
    }
    if let Some(cat) = &filter.category {
        if !a.category.eq_ignore_ascii_case(cat) {
            return false;
        }
    }
    if filter.featured_only && !a.is_featured {
        return false;
    }
    if let Some(needle) = &filter.search {
        let needle = needle.to_lowercase();
        let hit = a.title.to_lowercase().contains(&needle)
            || a.summary.to_lowercase().contains(&needle)
            || a.tags.iter().any(|t| t.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    true
}

fn sort_key(a: &StoredArticle) -> DateTime<Utc> {
    a.published_at.unwrap_or(a.created_at)
}

fn paginate<T: Clone>(items: &[T], page: &Page) -> Vec<T> {
    let size = page.size.max(1);
    let start = (page.number.max(1) - 1) * size;
    items.iter().skip(start).take(size).cloned().collect()
}

#[async_trait]
impl ArticleRepo for MemoryDb {
    async fn insert(&self, article: StoredArticle) -> Result<StoredArticle> {
        let mut guard = self.articles.write().map_err(|_| poisoned())?;
        guard.insert(article.id.clone(), article.clone());
        Ok(article)
    }

    async fn get(&self, id: &str) -> Result<Option<StoredArticle>> {
        let guard = self.articles.read().map_err(|_| poisoned())?;
        Ok(guard.get(id).cloned())
    }

    async fn list(
        &self,
        filter: &ArticleFilter,
        page: &Page,
    ) -> Result<(Vec<StoredArticle>, usize)> {
        let guard = self.articles.read().map_err(|_| poisoned())?;
        let mut rows: Vec<StoredArticle> = guard
            .values()
            .filter(|a| matches_filter(a, filter))
            .cloned()
            .collect();
        rows.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
        let total = rows.len();
        Ok((paginate(&rows, page), total))
    }

    async fn update(&self, id: &str, update: ArticleUpdate) -> Result<Option<StoredArticle>> {
        let mut guard = self.articles.write().map_err(|_| poisoned())?;
        let Some(a) = guard.get_mut(id) else {
            return Ok(None);
        };
        if let Some(v) = update.title {
            a.title = v;
        }
        if let Some(v) = update.content {
            a.content = v;
        }
        if let Some(v) = update.summary {
            a.summary = v;
        }
        if let Some(v) = update.category {
            a.category = v;
        }
        if let Some(v) = update.tags {
            a.tags = v;
        }
        if let Some(v) = update.is_featured {
            a.is_featured = v;
        }
        if let Some(v) = update.image_url {
            a.image_url = Some(v);
        }
        Ok(Some(a.clone()))
    }

    async fn publish(&self, id: &str) -> Result<Option<StoredArticle>> {
        let mut guard = self.articles.write().map_err(|_| poisoned())?;
        let Some(a) = guard.get_mut(id) else {
            return Ok(None);
        };
        a.status = ArticleStatus::Published;
        a.published_at = Some(Utc::now());
        Ok(Some(a.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut guard = self.articles.write().map_err(|_| poisoned())?;
        Ok(guard.remove(id).is_some())
    }

    async fn increment_views(&self, id: &str) -> Result<Option<u64>> {
        let mut guard = self.articles.write().map_err(|_| poisoned())?;
        Ok(guard.get_mut(id).map(|a| {
            a.views += 1;
            a.views
        }))
    }

    async fn increment_likes(&self, id: &str) -> Result<Option<u64>> {
        let mut guard = self.articles.write().map_err(|_| poisoned())?;
        Ok(guard.get_mut(id).map(|a| {
            a.likes += 1;
            a.likes
        }))
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let guard = self.articles.read().map_err(|_| poisoned())?;
        let mut cats: Vec<String> = guard
            .values()
            .filter(|a| a.status == ArticleStatus::Published)
            .map(|a| a.category.clone())
            .collect();
        cats.sort();
        cats.dedup();
        Ok(cats)
    }

    async fn count(&self, filter: &ArticleFilter) -> Result<usize> {
        let guard = self.articles.read().map_err(|_| poisoned())?;
        Ok(guard.values().filter(|a| matches_filter(a, filter)).count())
    }
}

#[async_trait]
impl CommentRepo for MemoryDb {
    async fn insert(&self, comment: Comment) -> Result<Comment> {
        let mut guard = self.comments.write().map_err(|_| poisoned())?;
        guard.insert(comment.id.clone(), comment.clone());
        Ok(comment)
    }

    async fn get(&self, id: &str) -> Result<Option<Comment>> {
        let guard = self.comments.read().map_err(|_| poisoned())?;
        Ok(guard.get(id).cloned())
    }

    async fn list(&self, approved: Option<bool>, page: &Page) -> Result<(Vec<Comment>, usize)> {
        let guard = self.comments.read().map_err(|_| poisoned())?;
        let mut rows: Vec<Comment> = guard
            .values()
            .filter(|c| approved.map_or(true, |want| c.approved == want))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = rows.len();
        Ok((paginate(&rows, page), total))
    }

    async fn list_for_article(&self, article_id: &str, approved_only: bool) -> Result<Vec<Comment>> {
        let guard = self.comments.read().map_err(|_| poisoned())?;
        let mut rows: Vec<Comment> = guard
            .values()
            .filter(|c| c.article_id == article_id && (!approved_only || c.approved))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn set_approved(&self, id: &str, approved: bool) -> Result<Option<Comment>> {
        let mut guard = self.comments.write().map_err(|_| poisoned())?;
        Ok(guard.get_mut(id).map(|c| {
            c.approved = approved;
            c.clone()
        }))
    }

    async fn delete_for_article(&self, article_id: &str) -> Result<usize> {
        let mut guard = self.comments.write().map_err(|_| poisoned())?;
        let before = guard.len();
        guard.retain(|_, c| c.article_id != article_id);
        Ok(before - guard.len())
    }

    async fn count(&self, approved: Option<bool>) -> Result<usize> {
        let guard = self.comments.read().map_err(|_| poisoned())?;
        Ok(guard
            .values()
            .filter(|c| approved.map_or(true, |want| c.approved == want))
            .count())
    }
}

#[async_trait]
impl UserRepo for MemoryDb {
    async fn insert(&self, user: User) -> Result<User> {
        let mut guard = self.users.write().map_err(|_| poisoned())?;
        guard.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let guard = self.users.read().map_err(|_| poisoned())?;
        Ok(guard
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let guard = self.users.read().map_err(|_| poisoned())?;
        Ok(guard.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(db: &MemoryDb, title: &str, status: ArticleStatus) -> StoredArticle {
        StoredArticle {
            id: db.next_id(),
            title: title.to_string(),
            content: "body".into(),
            summary: format!("{title} summary"),
            author: "editor".into(),
            status,
            tags: vec!["test".into()],
            category: "General".into(),
            published_at: (status == ArticleStatus::Published).then(Utc::now),
            created_at: Utc::now(),
            views: 0,
            likes: 0,
            is_featured: false,
            source: "Editorial".into(),
            external_url: None,
            image_url: None,
        }
    }

    // `MemoryDb` implements all three repo traits; calls are qualified to
    // pick the intended one.

    #[tokio::test]
    async fn list_filters_by_status_and_sorts_newest_first() {
        let db = MemoryDb::new();
        let a = ArticleRepo::insert(&db, article(&db, "older", ArticleStatus::Published))
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let b = ArticleRepo::insert(&db, article(&db, "newer", ArticleStatus::Published))
            .await
            .unwrap();
        ArticleRepo::insert(&db, article(&db, "draft", ArticleStatus::Draft))
            .await
            .unwrap();

        let filter = ArticleFilter {
            status: Some(ArticleStatus::Published),
            ..Default::default()
        };
        let (rows, total) = ArticleRepo::list(&db, &filter, &Page::default())
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows[0].id, b.id);
        assert_eq!(rows[1].id, a.id);
    }

    #[tokio::test]
    async fn search_matches_title_summary_and_tags() {
        let db = MemoryDb::new();
        let mut art = article(&db, "Budget session", ArticleStatus::Published);
        art.tags = vec!["economy".into()];
        ArticleRepo::insert(&db, art).await.unwrap();

        for needle in ["budget", "summary", "ECONOMY"] {
            let filter = ArticleFilter {
                search: Some(needle.into()),
                ..Default::default()
            };
            let (_, total) = ArticleRepo::list(&db, &filter, &Page::default())
                .await
                .unwrap();
            assert_eq!(total, 1, "needle {needle:?} should match");
        }
    }

    #[tokio::test]
    async fn publish_sets_status_and_timestamp() {
        let db = MemoryDb::new();
        let a = ArticleRepo::insert(&db, article(&db, "draft", ArticleStatus::Draft))
            .await
            .unwrap();
        let published = db.publish(&a.id).await.unwrap().unwrap();
        assert_eq!(published.status, ArticleStatus::Published);
        assert!(published.published_at.is_some());
    }

    #[tokio::test]
    async fn delete_for_article_removes_only_its_comments() {
        let db = MemoryDb::new();
        for (aid, cid) in [("a1", "c1"), ("a1", "c2"), ("a2", "c3")] {
            CommentRepo::insert(&db, Comment {
                id: cid.into(),
                article_id: aid.into(),
                content: "hi".into(),
                author_name: "n".into(),
                author_email: "e@example.com".into(),
                approved: false,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        }
        let removed = db.delete_for_article("a1").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(CommentRepo::count(&db, None).await.unwrap(), 1);
    }
}
