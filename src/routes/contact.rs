/**
 * Contact Routes
 * Public contact form and the admin inbox
 */
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::{JsonBody, PathParam};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::storage::models::{ContactMessage, Id, NewContactMessage};
use crate::validation::Validator;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub inquiry_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ContactRequest>,
) -> ApiResult<(StatusCode, Json<ContactResponse>)> {
    let mut v = Validator::new();
    let name = v.required("name", request.name);
    let email = v.email("email", request.email);
    let subject = v.required("subject", request.subject);
    let message = v.required("message", request.message);
    let inquiry_type = v.required("inquiryType", request.inquiry_type);
    v.finish()?;

    let stored = state
        .storage
        .create_contact_message(NewContactMessage {
            name,
            email,
            subject,
            message,
            inquiry_type,
        })
        .await?;
    tracing::info!(
        message_id = stored.id,
        inquiry_type = %stored.inquiry_type,
        "contact message received"
    );

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            message: "Your message has been sent".to_string(),
        }),
    ))
}

/// GET /api/contact-messages
pub async fn list_messages(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<Vec<ContactMessage>>> {
    caller.require_admin()?;
    Ok(Json(state.storage.list_contact_messages().await?))
}

/// PATCH /api/contact-messages/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParam(id): PathParam<Id>,
) -> ApiResult<Json<ContactMessage>> {
    caller.require_admin()?;
    let message = state
        .storage
        .mark_contact_message_as_read(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Message"))?;
    Ok(Json(message))
}
