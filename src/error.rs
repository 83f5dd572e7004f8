// src/error.rs
//! HTTP error taxonomy. Every handler failure maps to a status and a
//! `{ "error": ..., "details"?: ... }` JSON body; no raw panic or stack
//! trace ever reaches the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::fetch::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing required API key/secret. Fatal for the endpoint, not the process.
    #[error("{0}")]
    Configuration(String),

    /// Third-party API failure or timeout.
    #[error("{message}")]
    Upstream {
        message: String,
        details: Option<String>,
    },

    /// Valid upstream call, zero results.
    #[error("{0}")]
    Empty(String),

    /// Missing/invalid required body or query field.
    #[error("{0}")]
    Validation(String),

    /// Missing/invalid/expired token.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but lacking the required role.
    #[error("{0}")]
    Forbidden(String),

    /// Resource id absent.
    #[error("{0}")]
    NotFound(String),

    /// Primary-data store failure.
    #[error("{0}")]
    Persistence(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Empty(_) | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::NotConfigured(what) => {
                ApiError::Configuration(format!("{what} is not configured"))
            }
            FetchError::Upstream { status, message } => ApiError::Upstream {
                message: format!("upstream returned {status}"),
                details: Some(message),
            },
            FetchError::Transport(message) => ApiError::Upstream {
                message: "upstream unavailable".to_string(),
                details: Some(message),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Persistence details stay in the logs, not in the response body.
        if let ApiError::Persistence(ref e) = self {
            tracing::error!(error = ?e, "persistence failure");
            let body = json!({ "error": "Internal storage error" });
            return (status, Json(body)).into_response();
        }
        let mut body = json!({ "error": self.to_string() });
        if let ApiError::Upstream {
            details: Some(d), ..
        } = &self
        {
            body["details"] = json!(d);
        }
        (status, Json(body)).into_response()
    }
}
