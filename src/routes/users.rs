/**
 * User Routes
 * Listing and lookup are public; mutations are reserved to admins
 */
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::auth::{register_user, UserForm};
use super::{JsonBody, MessageResponse, PathParam, QueryParams};
use crate::auth::{hash_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::storage::models::{Id, User, UserPatch, UserType};
use crate::validation::{is_valid_email, Validator};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(rename = "type")]
    pub user_type: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub user_type: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub profile_image: Option<String>,
    pub is_verified: Option<bool>,
}

/// GET /api/users?type=
pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<UserListQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let mut v = Validator::new();
    let user_type = v.optional_one_of::<UserType>("type", query.user_type);
    v.finish()?;
    Ok(Json(state.storage.list_users(user_type).await?))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    PathParam(id): PathParam<Id>,
) -> ApiResult<Json<User>> {
    let user = state
        .storage
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(user))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(form): JsonBody<UserForm>,
) -> ApiResult<(StatusCode, Json<User>)> {
    caller.require_admin()?;
    let user = register_user(&state, form, None, Validator::new()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PATCH /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParam(id): PathParam<Id>,
    JsonBody(request): JsonBody<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    caller.require_admin()?;

    let mut v = Validator::new();
    let username = request.username.map(|u| u.trim().to_string());
    if let Some(username) = &username {
        v.check(!username.is_empty(), "username", "username cannot be empty");
    }
    let email = request.email.map(|e| e.trim().to_string());
    if let Some(email) = &email {
        v.check(is_valid_email(email), "email", "Invalid email address");
    }
    let full_name = request.full_name.map(|n| n.trim().to_string());
    if let Some(full_name) = &full_name {
        v.check(!full_name.is_empty(), "fullName", "fullName cannot be empty");
    }
    if let Some(password) = &request.password {
        v.check(!password.is_empty(), "password", "password cannot be empty");
    }
    let user_type = v.optional_one_of::<UserType>("userType", request.user_type);
    v.finish()?;

    if state.storage.get_user(id).await?.is_none() {
        return Err(ApiError::not_found("User"));
    }
    let password_hash = match request.password {
        Some(password) => Some(hash_password(password, state.config.bcrypt_cost).await?),
        None => None,
    };

    let user = state
        .storage
        .update_user(
            id,
            UserPatch {
                username,
                password_hash,
                email,
                user_type,
                full_name,
                company: request.company,
                title: request.title,
                bio: request.bio,
                location: request.location,
                profile_image: request.profile_image,
                is_verified: request.is_verified,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    tracing::info!(user_id = user.id, updated_by = caller.0.id, "user updated");
    Ok(Json(user))
}

/// DELETE /api/users/{id}
/// Also ends every session the user holds.
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParam(id): PathParam<Id>,
) -> ApiResult<Json<MessageResponse>> {
    caller.require_admin()?;
    if !state.storage.delete_user(id).await? {
        return Err(ApiError::not_found("User"));
    }
    let sessions = state.sessions.revoke_user(id).await;
    tracing::info!(user_id = id, deleted_by = caller.0.id, sessions, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
