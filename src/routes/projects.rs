/**
 * Project Routes
 * Project listing with skills and client names, creation with skills,
 * owner-gated updates and deletion, bulk deletion
 */
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::{JsonBody, MessageResponse, PathParam, QueryParams};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::storage::models::{Id, NewProject, Project, ProjectPatch, ProjectStatus, UserType};
use crate::storage::Storage;
use crate::validation::{non_blank, Validator};
use crate::AppState;

const UNKNOWN_CLIENT: &str = "Unknown Client";

// ============================================================================
// Types
// ============================================================================

/// A project with its skill tags and the posting client's name.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub skills: Vec<String>,
    pub client_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub client_id: Option<Id>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub budget: Option<String>,
    pub timeframe: Option<String>,
    pub additional_details: Option<String>,
    pub status: Option<String>,
    pub skills: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub budget: Option<String>,
    pub timeframe: Option<String>,
    pub additional_details: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Option<Vec<Id>>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub message: String,
    pub count: usize,
}

// ============================================================================
// Helpers
// ============================================================================

async fn project_view(storage: &dyn Storage, project: Project) -> ApiResult<ProjectView> {
    let skills = storage
        .get_project_skills(project.id)
        .await?
        .into_iter()
        .map(|s| s.skill)
        .collect();
    let client_name = storage
        .get_user(project.client_id)
        .await?
        .map(|client| client.full_name)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
    Ok(ProjectView {
        project,
        skills,
        client_name,
    })
}

pub(crate) async fn load_project(storage: &dyn Storage, id: Id) -> ApiResult<Project> {
    storage
        .get_project(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))
}

/// Non-blank, trimmed optional text; blank values are reported on `field`.
fn optional_text(v: &mut Validator, field: &str, value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = non_blank(Some(value));
    if trimmed.is_none() {
        v.add(field, format!("{} cannot be empty", field));
    }
    trimmed
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/projects?status=
pub async fn list_projects(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ProjectListQuery>,
) -> ApiResult<Json<Vec<ProjectView>>> {
    let mut v = Validator::new();
    let status = v.optional_one_of::<ProjectStatus>("status", query.status);
    v.finish()?;

    let storage = state.storage.as_ref();
    let mut views = Vec::new();
    for project in storage.list_projects(status).await? {
        views.push(project_view(storage, project).await?);
    }
    Ok(Json(views))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    PathParam(id): PathParam<Id>,
) -> ApiResult<Json<ProjectView>> {
    let storage = state.storage.as_ref();
    let project = load_project(storage, id).await?;
    Ok(Json(project_view(storage, project).await?))
}

/// POST /api/projects
/// Clients post for themselves; admins may post on behalf of a client.
pub async fn create_project(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(request): JsonBody<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectView>)> {
    caller.require_type(&[UserType::Client, UserType::Admin])?;

    let mut v = Validator::new();
    let title = v.required("title", request.title);
    let description = v.required("description", request.description);
    let requirements = v.required("requirements", request.requirements);
    let budget = v.required("budget", request.budget);
    let timeframe = v.required("timeframe", request.timeframe);
    let status = v.optional_one_of::<ProjectStatus>("status", request.status);
    if let Some(status) = status {
        v.check(
            status == ProjectStatus::Open || caller.0.is_admin(),
            "status",
            "New projects must start as open",
        );
    }
    v.finish()?;

    let client_id = match (caller.0.user_type, request.client_id) {
        (UserType::Admin, Some(client_id)) => {
            if state.storage.get_user(client_id).await?.is_none() {
                return Err(ApiError::not_found("Client"));
            }
            client_id
        }
        (UserType::Client, Some(client_id)) if client_id != caller.0.id => {
            return Err(ApiError::Forbidden(
                "Clients can only post projects for themselves".to_string(),
            ));
        }
        _ => caller.0.id,
    };

    let skills: Vec<String> = request
        .skills
        .unwrap_or_default()
        .into_iter()
        .filter_map(|skill| non_blank(Some(skill)))
        .collect();

    let (project, skills) = state
        .storage
        .create_project_with_skills(
            NewProject {
                client_id,
                title,
                description,
                requirements,
                budget,
                timeframe,
                additional_details: non_blank(request.additional_details),
                status,
            },
            skills,
        )
        .await?;

    tracing::info!(
        project_id = project.id,
        client_id = project.client_id,
        skills = skills.len(),
        "project created"
    );

    let client_name = state
        .storage
        .get_user(project.client_id)
        .await?
        .map(|client| client.full_name)
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
    Ok((
        StatusCode::CREATED,
        Json(ProjectView {
            project,
            skills: skills.into_iter().map(|s| s.skill).collect(),
            client_name,
        }),
    ))
}

/// PATCH /api/projects/{id}
/// Status changes must follow the project lifecycle.
pub async fn update_project(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParam(id): PathParam<Id>,
    JsonBody(request): JsonBody<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectView>> {
    let storage = state.storage.as_ref();
    let project = load_project(storage, id).await?;
    caller.require_self_or_admin(project.client_id)?;

    let mut v = Validator::new();
    let title = optional_text(&mut v, "title", request.title);
    let description = optional_text(&mut v, "description", request.description);
    let requirements = optional_text(&mut v, "requirements", request.requirements);
    let budget = optional_text(&mut v, "budget", request.budget);
    let timeframe = optional_text(&mut v, "timeframe", request.timeframe);
    let status = v.optional_one_of::<ProjectStatus>("status", request.status);
    v.finish()?;

    // The lifecycle is checked by storage against the current row.
    let updated = storage
        .update_project(
            id,
            ProjectPatch {
                title,
                description,
                requirements,
                budget,
                timeframe,
                additional_details: non_blank(request.additional_details),
                status,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Project"))?;

    if updated.status != project.status {
        tracing::info!(
            project_id = id,
            from = %project.status,
            to = %updated.status,
            "project status changed"
        );
    }
    Ok(Json(project_view(storage, updated).await?))
}

/// DELETE /api/projects/{id}
/// Skills, applications and reviews of the project are left in place.
pub async fn delete_project(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParam(id): PathParam<Id>,
) -> ApiResult<Json<MessageResponse>> {
    let project = load_project(state.storage.as_ref(), id).await?;
    caller.require_self_or_admin(project.client_id)?;

    if !state.storage.delete_project(id).await? {
        return Err(ApiError::not_found("Project"));
    }
    tracing::info!(project_id = id, deleted_by = caller.0.id, "project deleted");
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

/// POST /api/projects/bulk-delete
pub async fn bulk_delete_projects(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(request): JsonBody<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteResponse>> {
    caller.require_admin()?;
    let ids = request.ids.unwrap_or_default();
    if ids.is_empty() {
        return Err(ApiError::invalid("ids", "Invalid project IDs"));
    }

    let count = state.storage.delete_projects(&ids).await?;
    tracing::info!(requested = ids.len(), deleted = count, "projects bulk deleted");
    Ok(Json(BulkDeleteResponse {
        message: format!("{} projects deleted successfully", count),
        count,
    }))
}

/// GET /api/clients/{id}/projects
pub async fn list_client_projects(
    State(state): State<AppState>,
    PathParam(client_id): PathParam<Id>,
) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.storage.get_projects_by_client_id(client_id).await?))
}
