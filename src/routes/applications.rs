/**
 * Application Routes
 * Hackers bid on projects; the owning client (or an admin) decides
 */
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::hackers::load_hacker;
use super::projects::load_project;
use super::{JsonBody, PathParam};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::storage::models::{Application, ApplicationPatch, ApplicationStatus, Id, NewApplication};
use crate::validation::Validator;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationRequest {
    pub project_id: Option<Id>,
    pub hacker_id: Option<Id>,
    pub proposal: Option<String>,
    pub estimated_time: Option<String>,
    pub price_quote: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationDecisionRequest {
    pub status: Option<String>,
}

/// POST /api/applications
pub async fn create_application(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateApplicationRequest>,
) -> ApiResult<(StatusCode, Json<Application>)> {
    let mut v = Validator::new();
    let project_id = v.present("projectId", request.project_id);
    let hacker_id = v.present("hackerId", request.hacker_id);
    let proposal = v.required("proposal", request.proposal);
    let estimated_time = v.required("estimatedTime", request.estimated_time);
    let price_quote = v.required("priceQuote", request.price_quote);
    v.finish()?;

    let storage = state.storage.as_ref();
    load_project(storage, project_id).await?;
    load_hacker(storage, hacker_id).await?;

    let application = storage
        .create_application(NewApplication {
            project_id,
            hacker_id,
            proposal,
            estimated_time,
            price_quote,
        })
        .await?;

    tracing::info!(
        application_id = application.id,
        project_id,
        hacker_id,
        "application submitted"
    );
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/applications
pub async fn list_applications(
    State(state): State<AppState>,
    caller: AuthUser,
) -> ApiResult<Json<Vec<Application>>> {
    caller.require_admin()?;
    Ok(Json(state.storage.list_applications().await?))
}

/// GET /api/projects/{id}/applications
pub async fn list_project_applications(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParam(project_id): PathParam<Id>,
) -> ApiResult<Json<Vec<Application>>> {
    let project = load_project(state.storage.as_ref(), project_id).await?;
    caller.require_self_or_admin(project.client_id)?;
    Ok(Json(
        state.storage.get_applications_by_project_id(project_id).await?,
    ))
}

/// PATCH /api/applications/{id}
/// Accept or reject a pending application. Decisions are final.
pub async fn decide_application(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParam(id): PathParam<Id>,
    JsonBody(request): JsonBody<ApplicationDecisionRequest>,
) -> ApiResult<Json<Application>> {
    let storage = state.storage.as_ref();
    let application = storage
        .get_application(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Application"))?;
    let project = load_project(storage, application.project_id).await?;
    caller.require_self_or_admin(project.client_id)?;

    let mut v = Validator::new();
    let status = v.one_of::<ApplicationStatus>("status", request.status);
    v.finish()?;

    // The transition is checked by storage against the current row.
    let updated = storage
        .update_application(
            id,
            ApplicationPatch {
                status,
                ..Default::default()
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Application"))?;

    tracing::info!(
        application_id = id,
        project_id = updated.project_id,
        status = %updated.status,
        decided_by = caller.0.id,
        "application decided"
    );
    Ok(Json(updated))
}
