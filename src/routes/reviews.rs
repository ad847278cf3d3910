/**
 * Review Routes
 */
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::hackers::load_hacker;
use super::projects::load_project;
use super::{JsonBody, PathParam};
use crate::error::ApiResult;
use crate::storage::models::{Id, NewReview, Review};
use crate::validation::{non_blank, Validator};
use crate::AppState;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub project_id: Option<Id>,
    pub client_id: Option<Id>,
    pub hacker_id: Option<Id>,
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

/// POST /api/reviews
pub async fn create_review(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    let mut v = Validator::new();
    let project_id = v.present("projectId", request.project_id);
    let client_id = v.present("clientId", request.client_id);
    let hacker_id = v.present("hackerId", request.hacker_id);
    let rating = v.range("rating", request.rating, MIN_RATING, MAX_RATING);
    v.finish()?;

    let storage = state.storage.as_ref();
    load_project(storage, project_id).await?;
    load_hacker(storage, hacker_id).await?;

    let review = storage
        .create_review(NewReview {
            project_id,
            client_id,
            hacker_id,
            rating,
            comment: non_blank(request.comment),
        })
        .await?;

    tracing::info!(review_id = review.id, hacker_id, rating, "review created");
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /api/reviews/hacker/{id}
pub async fn list_hacker_reviews(
    State(state): State<AppState>,
    PathParam(hacker_id): PathParam<Id>,
) -> ApiResult<Json<Vec<Review>>> {
    let storage = state.storage.as_ref();
    load_hacker(storage, hacker_id).await?;
    Ok(Json(storage.get_reviews_by_hacker_id(hacker_id).await?))
}
