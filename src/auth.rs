// src/auth.rs
//! Bearer-token auth: HS256 JWT issue/verify, salted password digests,
//! and the startup admin bootstrap.

use anyhow::{Context, Result};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::store::{Role, User, UserRepo};

const TOKEN_LIFETIME_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

pub fn issue_token(secret: &str, user: &User) -> Result<String> {
    let exp = (Utc::now() + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize;
    let claims = Claims {
        sub: user.id.clone(),
        role: user.role,
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .context("signing token")
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("Invalid token.".to_string()))
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// Password digests
// ---------------------------------------------------------------------------

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Salted digest stored as `salt$hex`.
pub fn hash_password(password: &str) -> String {
    use rand::Rng;
    let salt: String = rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("{salt}${}", digest(&salt, password))
}

pub fn verify_password(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest(salt, password) == expected,
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Flows
// ---------------------------------------------------------------------------

/// Resolve the bearer token in `headers` to an active admin user.
pub async fn authenticate_admin(
    users: &dyn UserRepo,
    secret: Option<&str>,
    headers: &HeaderMap,
) -> Result<User, ApiError> {
    let secret = secret
        .ok_or_else(|| ApiError::Configuration("JWT_SECRET is not configured".to_string()))?;
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Access denied. No token provided.".to_string()))?;
    let claims = verify_token(secret, token)?;
    let user = users
        .find_by_id(&claims.sub)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| ApiError::Unauthorized("Invalid token.".to_string()))?;
    if user.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "Access denied. Admin privileges required.".to_string(),
        ));
    }
    Ok(user)
}

pub async fn login(
    users: &dyn UserRepo,
    secret: Option<&str>,
    username: &str,
    password: &str,
) -> Result<String, ApiError> {
    let secret = secret
        .ok_or_else(|| ApiError::Configuration("JWT_SECRET is not configured".to_string()))?;
    let user = users
        .find_by_username(username)
        .await?
        .filter(|u| u.active && verify_password(&u.password_digest, password))
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials.".to_string()))?;
    issue_token(secret, &user).map_err(ApiError::Persistence)
}

/// Create the initial admin account when configured and absent.
pub async fn bootstrap_admin(users: &dyn UserRepo, cfg: &AppConfig) -> Result<()> {
    let Some(password) = &cfg.admin_bootstrap_password else {
        return Ok(());
    };
    if users.find_by_username("admin").await?.is_some() {
        return Ok(());
    }
    users
        .insert(User {
            id: "admin".to_string(),
            username: "admin".to_string(),
            password_digest: hash_password(password),
            role: Role::Admin,
            active: true,
        })
        .await?;
    tracing::info!("bootstrap admin account created");
    Ok(())
}
