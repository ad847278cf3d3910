/**
 * Authentication
 * Signed session tokens, the revocable session table, password hashing and
 * the extractor that resolves the calling user
 */
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::distr::{Alphanumeric, SampleString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{ApiError, ApiResult};
use crate::storage::models::{Id, User, UserType};
use crate::AppState;

// ============================================================================
// Tokens
// ============================================================================

/// JWT claims carried by a session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Id,
    pub role: UserType,
    /// Session id; the session table is keyed by its hash.
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

fn hash_session_id(jti: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(jti.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Extract bearer token from Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ============================================================================
// Session table
// ============================================================================

#[derive(Debug, Clone)]
struct SessionEntry {
    user_id: Id,
    expires_at: i64,
}

/// Live sessions. A token is only honoured while its session is present, so
/// logout takes effect before the token itself expires.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for `user` and return its signed token.
    pub async fn issue(&self, user: &User, secret: &str, ttl: Duration) -> ApiResult<String> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(ttl)
            .ok_or_else(|| ApiError::Internal("session lifetime out of range".to_string()))?;
        let claims = Claims {
            sub: user.id,
            role: user.user_type,
            jti: Alphanumeric.sample_string(&mut rand::rng(), 32),
            exp: expires.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("failed to sign session token: {}", e)))?;

        let mut sessions = self.sessions.write().await;
        // Drop expired sessions so the table tracks live logins only.
        let now_ts = now.timestamp();
        sessions.retain(|_, entry| entry.expires_at > now_ts);
        sessions.insert(
            hash_session_id(&claims.jti),
            SessionEntry {
                user_id: user.id,
                expires_at: claims.exp,
            },
        );

        Ok(token)
    }

    /// User id behind a token, if the token verifies and its session is live.
    pub async fn resolve(&self, token: &str, secret: &str) -> Option<Id> {
        let claims = decode_token(token, secret).ok()?;
        let sessions = self.sessions.read().await;
        let entry = sessions.get(&hash_session_id(&claims.jti))?;
        (entry.user_id == claims.sub && entry.expires_at > Utc::now().timestamp())
            .then_some(entry.user_id)
    }

    /// Returns whether a live session was removed.
    pub async fn revoke(&self, token: &str, secret: &str) -> bool {
        let Ok(claims) = decode_token(token, secret) else {
            return false;
        };
        let mut sessions = self.sessions.write().await;
        sessions.remove(&hash_session_id(&claims.jti)).is_some()
    }

    pub async fn revoke_user(&self, user_id: Id) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.user_id != user_id);
        before - sessions.len()
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

// ============================================================================
// Passwords
// ============================================================================

// bcrypt is CPU-bound, so both directions run on the blocking pool.

pub async fn hash_password(password: String, cost: u32) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {}", e)))
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, password_hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || verify(password, &password_hash).unwrap_or(false))
        .await
        .map_err(|e| ApiError::Internal(format!("verification task failed: {}", e)))
}

// ============================================================================
// Extractor
// ============================================================================

/// The authenticated caller, reloaded from storage on every request.
///
/// Rejects with 401 when the token is missing, invalid, revoked, or when its
/// user no longer exists.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn require_admin(&self) -> ApiResult<()> {
        if self.0.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }

    /// Passes for `owner_id` itself and for admins.
    pub fn require_self_or_admin(&self, owner_id: Id) -> ApiResult<()> {
        if self.0.id == owner_id || self.0.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }

    pub fn require_type(&self, allowed: &[UserType]) -> ApiResult<()> {
        if allowed.contains(&self.0.user_type) {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(ApiError::unauthenticated)?;
        let user_id = state
            .sessions
            .resolve(token, &state.config.jwt_secret)
            .await
            .ok_or_else(ApiError::unauthenticated)?;
        let user = state
            .storage
            .get_user(user_id)
            .await?
            .ok_or_else(ApiError::unauthenticated)?;
        Ok(AuthUser(user))
    }
}
