/**
 * API Errors
 * One error type for every handler, rendered as a shared JSON shape
 */
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::StorageError;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation error")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    /// Uniqueness collision (username, email). Reported as 400.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    /// The inner text is logged, never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }

    pub fn unauthenticated() -> Self {
        ApiError::Unauthorized("Not authenticated".to_string())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("Insufficient permissions".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(errors) => ErrorResponse {
                error: "Validation error".to_string(),
                message: None,
                errors: Some(errors),
            },
            ApiError::Internal(cause) => {
                tracing::error!(cause = %cause, "request failed with internal error");
                ErrorResponse {
                    error: "Internal server error".to_string(),
                    message: None,
                    errors: None,
                }
            }
            ApiError::PayloadTooLarge => ErrorResponse {
                error: "Request body too large".to_string(),
                message: None,
                errors: None,
            },
            ApiError::BadRequest(message)
            | ApiError::Conflict(message)
            | ApiError::NotFound(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message) => ErrorResponse {
                error: message,
                message: None,
                errors: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::Duplicate { .. } => ApiError::Conflict(err.to_string()),
            StorageError::InvalidTransition { .. } => ApiError::invalid("status", err.to_string()),
            StorageError::Backend(_) => ApiError::Internal(err.to_string()),
        }
    }
}

/// Field path and message from a typed-data rejection body such as
/// `Failed to deserialize ...: projectId: invalid type: string "x", expected i32 at line 1 column 16`.
/// `None` when the error is not attributable to one field.
fn data_error_field(text: &str) -> Option<FieldError> {
    let (_, detail) = text.split_once(": ")?;
    let (path, message) = detail.split_once(": ")?;
    if path.is_empty() || path.contains(|c: char| c.is_whitespace() || c == '?') {
        return None;
    }
    let message = message.rsplit_once(" at line ").map_or(message, |(m, _)| m);
    Some(FieldError::new(path, message))
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge;
        }
        if let JsonRejection::JsonDataError(err) = &rejection {
            if let Some(field) = data_error_field(&err.body_text()) {
                return ApiError::Validation(vec![field]);
            }
        }
        ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let (status, json) = body_json(ApiError::Validation(vec![
            FieldError::new("email", "Invalid email address"),
            FieldError::new("fullName", "Full name is required"),
        ]))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Validation error");
        assert_eq!(json["errors"][0]["field"], "email");
        assert_eq!(json["errors"][1]["message"], "Full name is required");
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let (status, json) =
            body_json(StorageError::Backend("connection refused".to_string()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
        assert!(!json.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_storage_conflicts_map_to_client_errors() {
        let (status, json) = body_json(StorageError::Duplicate { what: "Email" }.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Email already exists");

        let (status, json) = body_json(
            StorageError::InvalidTransition {
                from: "accepted".to_string(),
                to: "rejected".to_string(),
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["errors"][0]["field"], "status");
        assert_eq!(
            json["errors"][0]["message"],
            "Cannot change status from accepted to rejected"
        );
    }

    #[test]
    fn test_data_error_field_extracts_path() {
        let field = data_error_field(
            "Failed to deserialize the JSON body into the target type: projectId: \
             invalid type: string \"abc\", expected i32 at line 1 column 18",
        )
        .unwrap();
        assert_eq!(field.field, "projectId");
        assert_eq!(field.message, "invalid type: string \"abc\", expected i32");

        assert!(data_error_field(
            "Failed to deserialize the JSON body into the target type: \
             invalid type: sequence, expected a map at line 1 column 0"
        )
        .is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Conflict("Username already exists".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::not_found("Project").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::unauthenticated().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden().status(), StatusCode::FORBIDDEN);
    }
}
