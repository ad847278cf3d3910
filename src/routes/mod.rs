/**
 * Routes Module
 * API route handlers and the extractors they share
 */

pub mod applications;
pub mod auth;
pub mod contact;
pub mod dashboard;
pub mod hackers;
pub mod health;
pub mod projects;
pub mod reviews;
pub mod testimonials;
pub mod users;

use axum::extract::{FromRequest, FromRequestParts};
use serde::Serialize;

use crate::error::ApiError;

/// JSON body whose rejections render as [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Path parameters whose rejections render as [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// Query string whose rejections render as [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// `{ "message": ... }`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        Router,
    };
    use chrono::Duration;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::auth::{hash_password, SessionStore};
    use crate::config::AppConfig;
    use crate::storage::models::{NewUser, User, UserType};
    use crate::storage::{MemStorage, Storage};
    use crate::{create_app, AppState};

    pub const PASSWORD: &str = "password123";

    /// Fresh, unseeded state with the cheapest bcrypt cost.
    pub fn test_state() -> AppState {
        let config = AppConfig {
            bcrypt_cost: 4,
            seed_admins: false,
            ..AppConfig::default()
        };
        AppState {
            storage: Arc::new(MemStorage::new()),
            sessions: Arc::new(SessionStore::new()),
            config: Arc::new(config),
        }
    }

    pub fn app(state: &AppState) -> Router {
        create_app(state.clone())
    }

    /// Insert a user whose password is [`PASSWORD`].
    pub async fn create_user(state: &AppState, username: &str, user_type: UserType) -> User {
        let password_hash = hash_password(PASSWORD.to_string(), 4).await.unwrap();
        state
            .storage
            .create_user(NewUser {
                username: username.to_string(),
                password_hash,
                email: format!("{}@example.com", username),
                user_type,
                full_name: format!("{} Tester", capitalize(username)),
                company: None,
                title: None,
                bio: None,
                location: None,
                profile_image: None,
                is_verified: None,
            })
            .await
            .unwrap()
    }

    pub async fn token_for(state: &AppState, user: &User) -> String {
        state
            .sessions
            .issue(user, &state.config.jwt_secret, Duration::hours(1))
            .await
            .unwrap()
    }

    /// Send one request through the full router and decode the JSON reply
    /// (`Value::Null` for an empty body).
    pub async fn send(
        state: &AppState,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app(state).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub fn error_fields(json: &serde_json::Value) -> Vec<String> {
        json["errors"]
            .as_array()
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e["field"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn capitalize(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}
