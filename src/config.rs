// src/config.rs
//! Runtime configuration, read once from the environment at startup and
//! passed down explicitly. No module-level mutable state.

use std::env;
use std::time::Duration;

pub const DEFAULT_CACHE_TTL_SECS: u64 = 6 * 60 * 60;
pub const DEFAULT_SUMMARY_CHUNK_SIZE: usize = 5;
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_BATCH_PACING_MS: u64 = 1500;
pub const DEFAULT_TREND_PACING_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// SerpAPI key, shared by the news-search and trends-search clients.
    pub serpapi_key: Option<String>,
    /// Google Gemini key. Absent => AI summarization disabled, fallbacks used.
    pub google_api_key: Option<String>,
    /// Document-store connection string. Recognized but optional; this build
    /// ships the in-memory backend.
    pub database_url: Option<String>,
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: Option<String>,
    /// Password for the bootstrap admin account created at startup.
    pub admin_bootstrap_password: Option<String>,
    pub cache_ttl: Duration,
    pub summary_chunk_size: usize,
    pub ai_timeout: Duration,
    /// Delay between sequential AI summarization batches.
    pub batch_pacing: Duration,
    /// Delay between sequential per-trend upstream calls.
    pub trend_pacing: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parse_env("PORT").unwrap_or(8080),
            serpapi_key: non_empty_env("SERPAPI_KEY"),
            google_api_key: non_empty_env("GOOGLE_API_KEY"),
            database_url: non_empty_env("DATABASE_URL"),
            jwt_secret: non_empty_env("JWT_SECRET"),
            admin_bootstrap_password: non_empty_env("ADMIN_BOOTSTRAP_PASSWORD"),
            cache_ttl: Duration::from_secs(
                parse_env("CACHE_TTL_SECS").unwrap_or(DEFAULT_CACHE_TTL_SECS),
            ),
            summary_chunk_size: parse_env("SUMMARY_CHUNK_SIZE")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(DEFAULT_SUMMARY_CHUNK_SIZE),
            ai_timeout: Duration::from_secs(
                parse_env("AI_TIMEOUT_SECS").unwrap_or(DEFAULT_AI_TIMEOUT_SECS),
            ),
            batch_pacing: Duration::from_millis(
                parse_env("BATCH_PACING_MS").unwrap_or(DEFAULT_BATCH_PACING_MS),
            ),
            trend_pacing: Duration::from_millis(
                parse_env("TREND_PACING_MS").unwrap_or(DEFAULT_TREND_PACING_MS),
            ),
        }
    }

    /// Config suitable for tests: no upstream keys, zero pacing delays.
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            serpapi_key: None,
            google_api_key: None,
            database_url: None,
            jwt_secret: Some("test-secret".to_string()),
            admin_bootstrap_password: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            summary_chunk_size: DEFAULT_SUMMARY_CHUNK_SIZE,
            ai_timeout: Duration::from_secs(1),
            batch_pacing: Duration::from_millis(0),
            trend_pacing: Duration::from_millis(0),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
