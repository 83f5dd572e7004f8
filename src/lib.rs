// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod merge;
pub mod metrics;
pub mod store;
pub mod summarize;

// ---- Re-exports for stable public API ----
// Router assembly: `newsdesk::api::router` or `newsdesk::router`.
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::error::ApiError;
