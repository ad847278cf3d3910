/**
 * Testimonial Routes
 * Homepage quotes resolved from testimonial -> review -> client
 */
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::{JsonBody, PathParam, QueryParams};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::storage::models::{Id, NewTestimonial, Testimonial, TestimonialPatch};
use crate::storage::Storage;
use crate::validation::Validator;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct TestimonialView {
    pub id: Id,
    pub content: String,
    pub name: String,
    pub title: String,
    pub avatar: String,
}

#[derive(Debug, Deserialize)]
pub struct TestimonialQuery {
    pub featured: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestimonialRequest {
    pub review_id: Option<Id>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTestimonialRequest {
    pub is_featured: Option<bool>,
}

/// `None` when the review or its client no longer exists.
async fn testimonial_view(
    storage: &dyn Storage,
    testimonial: &Testimonial,
) -> ApiResult<Option<TestimonialView>> {
    let Some(review) = storage.get_review(testimonial.review_id).await? else {
        return Ok(None);
    };
    let Some(client) = storage.get_user(review.client_id).await? else {
        return Ok(None);
    };
    Ok(Some(TestimonialView {
        id: testimonial.id,
        content: review.comment.unwrap_or_default(),
        avatar: client.initials(),
        title: client.title.unwrap_or_default(),
        name: client.full_name,
    }))
}

/// GET /api/testimonials?featured=
pub async fn list_testimonials(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TestimonialQuery>,
) -> ApiResult<Json<Vec<TestimonialView>>> {
    let storage = state.storage.as_ref();
    let testimonials = match query.featured {
        Some(true) => storage.get_featured_testimonials().await?,
        Some(false) => storage
            .list_testimonials()
            .await?
            .into_iter()
            .filter(|t| !t.is_featured)
            .collect(),
        None => storage.list_testimonials().await?,
    };

    let mut views = Vec::new();
    for testimonial in &testimonials {
        match testimonial_view(storage, testimonial).await? {
            Some(view) => views.push(view),
            None => tracing::debug!(
                testimonial_id = testimonial.id,
                review_id = testimonial.review_id,
                "skipping testimonial with dangling reference"
            ),
        }
    }
    Ok(Json(views))
}

/// POST /api/testimonials
pub async fn create_testimonial(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(request): JsonBody<CreateTestimonialRequest>,
) -> ApiResult<(StatusCode, Json<Testimonial>)> {
    caller.require_admin()?;
    let mut v = Validator::new();
    let review_id = v.present("reviewId", request.review_id);
    v.finish()?;

    if state.storage.get_review(review_id).await?.is_none() {
        return Err(ApiError::not_found("Review"));
    }
    let testimonial = state
        .storage
        .create_testimonial(NewTestimonial {
            review_id,
            is_featured: request.is_featured,
        })
        .await?;
    tracing::info!(testimonial_id = testimonial.id, review_id, "testimonial created");
    Ok((StatusCode::CREATED, Json(testimonial)))
}

/// PATCH /api/testimonials/{id}
pub async fn update_testimonial(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParam(id): PathParam<Id>,
    JsonBody(request): JsonBody<UpdateTestimonialRequest>,
) -> ApiResult<Json<Testimonial>> {
    caller.require_admin()?;
    let testimonial = state
        .storage
        .update_testimonial(
            id,
            TestimonialPatch {
                is_featured: request.is_featured,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Testimonial"))?;
    Ok(Json(testimonial))
}
