/**
 * Authentication Routes
 * Signup, login/logout, current user, admin login/creation and the
 * self-service profile and password endpoints
 */
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{JsonBody, MessageResponse};
use crate::auth::{bearer_token, hash_password, verify_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::storage::models::{Id, NewUser, User, UserPatch, UserType};
use crate::validation::{non_blank, Validator};
use crate::AppState;

const MIN_NEW_PASSWORD_CHARS: usize = 8;

// ============================================================================
// Types
// ============================================================================

/// Public identity of an account.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub user_type: UserType,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            user_type: user.user_type,
        }
    }
}

/// Account fields accepted by signup, admin user creation and admin creation.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
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

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(flatten)]
    pub user: UserForm,
    pub terms_agreed: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub message: String,
    pub user: UserSummary,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserSummary,
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserSummary,
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Validate a [`UserForm`], hash the password and store the account.
/// Storage rejects a taken username or email. `forced_type` overrides
/// whatever `userType` was sent.
pub(crate) async fn register_user(
    state: &AppState,
    form: UserForm,
    forced_type: Option<UserType>,
    extra: Validator,
) -> ApiResult<User> {
    let mut v = extra;
    let username = v.required("username", form.username);
    let password = v.required_raw("password", form.password);
    let email = v.email("email", form.email);
    let full_name = v.required("fullName", form.full_name);
    let user_type = match forced_type {
        Some(user_type) => Some(user_type),
        None => v.one_of::<UserType>("userType", form.user_type),
    };
    v.finish()?;
    let user_type = user_type.ok_or_else(|| ApiError::invalid("userType", "userType is required"))?;

    let password_hash = hash_password(password, state.config.bcrypt_cost).await?;
    let user = state
        .storage
        .create_user(NewUser {
            username,
            password_hash,
            email,
            user_type,
            full_name,
            company: non_blank(form.company),
            title: non_blank(form.title),
            bio: non_blank(form.bio),
            location: non_blank(form.location),
            profile_image: non_blank(form.profile_image),
            is_verified: form.is_verified,
        })
        .await?;

    tracing::info!(
        user_id = user.id,
        username = %user.username,
        user_type = %user.user_type,
        "user created"
    );
    Ok(user)
}

/// Look up the account and check its password. Both failure modes report
/// the same 401 so usernames cannot be guessed.
async fn authenticate(state: &AppState, request: LoginRequest) -> ApiResult<User> {
    let mut v = Validator::new();
    let username = v.required("username", request.username);
    let password = v.required_raw("password", request.password);
    v.finish()?;

    let invalid = || ApiError::Unauthorized("Invalid username or password".to_string());

    let user = match state.storage.get_user_by_username(&username).await? {
        Some(user) => user,
        None => {
            tracing::warn!(username = %username, "login failed: unknown username");
            return Err(invalid());
        }
    };

    if !verify_password(password, user.password_hash.clone()).await? {
        tracing::warn!(user_id = user.id, "login failed: wrong password");
        return Err(invalid());
    }

    Ok(user)
}

async fn start_session(state: &AppState, user: &User) -> ApiResult<LoginResponse> {
    let access_token = state
        .sessions
        .issue(user, &state.config.jwt_secret, state.config.session_ttl)
        .await?;
    tracing::info!(user_id = user.id, user_type = %user.user_type, "session started");
    Ok(LoginResponse {
        user: UserSummary::from(user),
        access_token,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> ApiResult<(StatusCode, Json<CreatedUserResponse>)> {
    let mut v = Validator::new();
    v.check(
        request.terms_agreed == Some(true),
        "termsAgreed",
        "You must agree to the terms and conditions",
    );
    if request.user.user_type.as_deref().map(str::trim) == Some(UserType::Admin.as_str()) {
        v.add("userType", "Admin accounts can only be created by an admin");
    }

    let user = register_user(&state, request.user, None, v).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            message: "User created successfully".to_string(),
            user: UserSummary::from(&user),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = authenticate(&state, request).await?;
    Ok(Json(start_session(&state, &user).await?))
}

/// GET|POST /api/auth/logout
/// Idempotent: succeeds with or without a live session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<MessageResponse> {
    if let Some(token) = bearer_token(&headers) {
        if state.sessions.revoke(token, &state.config.jwt_secret).await {
            tracing::info!("session revoked");
        }
    }
    Json(MessageResponse::new("Logged out successfully"))
}

/// GET /api/auth/me, GET /api/user
pub async fn me(AuthUser(user): AuthUser) -> Json<UserSummary> {
    Json(UserSummary::from(&user))
}

/// POST /api/admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = authenticate(&state, request).await?;
    if !user.is_admin() {
        tracing::warn!(user_id = user.id, "admin login refused for non-admin account");
        return Err(ApiError::Forbidden(
            "Access denied. Admin privileges required.".to_string(),
        ));
    }
    Ok(Json(start_session(&state, &user).await?))
}

/// POST /api/admin/create
pub async fn admin_create(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(form): JsonBody<UserForm>,
) -> ApiResult<(StatusCode, Json<CreatedUserResponse>)> {
    caller.require_admin()?;
    let user = register_user(&state, form, Some(UserType::Admin), Validator::new()).await?;
    tracing::info!(created_by = caller.0.id, user_id = user.id, "admin account created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            message: "Admin user created successfully".to_string(),
            user: UserSummary::from(&user),
        }),
    ))
}

/// PATCH /api/user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(request): JsonBody<ProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let mut v = Validator::new();
    let full_name = request.full_name.map(|name| name.trim().to_string());
    if let Some(name) = &full_name {
        v.check(
            name.chars().count() >= 2,
            "fullName",
            "Full name must be at least 2 characters",
        );
    }
    let email = request.email.map(|email| email.trim().to_string());
    if let Some(email) = &email {
        v.check(
            crate::validation::is_valid_email(email),
            "email",
            "Please provide a valid email",
        );
    }
    v.finish()?;

    let updated = state
        .storage
        .update_user(
            user.id,
            UserPatch {
                full_name,
                email,
                company: request.company,
                title: request.title,
                location: request.location,
                bio: request.bio,
                profile_image: request.profile_image,
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    tracing::info!(user_id = updated.id, "profile updated");
    Ok(Json(ProfileResponse {
        user: UserSummary::from(&updated),
        company: updated.company,
        title: updated.title,
        location: updated.location,
        bio: updated.bio,
        profile_image: updated.profile_image,
    }))
}

/// PATCH /api/user/password
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(request): JsonBody<PasswordChangeRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let mut v = Validator::new();
    let current = v.required_raw("currentPassword", request.current_password);
    let new_password = v.required_raw("newPassword", request.new_password);
    v.min_chars("newPassword", &new_password, MIN_NEW_PASSWORD_CHARS);
    v.finish()?;

    if !verify_password(current, user.password_hash.clone()).await? {
        return Err(ApiError::invalid(
            "currentPassword",
            "Current password is incorrect",
        ));
    }

    let password_hash = hash_password(new_password, state.config.bcrypt_cost).await?;
    state
        .storage
        .update_user(
            user.id,
            UserPatch {
                password_hash: Some(password_hash),
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    tracing::info!(user_id = user.id, "password changed");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
