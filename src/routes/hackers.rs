/**
 * Hacker Routes
 * Hacker directory, featured cards, profile aggregate and profile
 * skill/certification management
 */
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JsonBody, PathParam};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::storage::models::{
    ApplicationStatus, HackerCertification, HackerSkill, Id, NewHackerCertification,
    NewHackerSkill, Review, User, UserType,
};
use crate::storage::Storage;
use crate::validation::{non_blank, Validator};
use crate::AppState;

const DEFAULT_TITLE: &str = "Security Specialist";
const DEFAULT_LOCATION: &str = "Remote";
const DEFAULT_HOURLY_RATE: &str = "$80-120/hr";
const DEFAULT_AVAILABILITY: &str = "20 hrs/week";
const DEFAULT_DESCRIPTION: &str = "Experienced security specialist with expertise in \
     penetration testing and vulnerability assessment.";
const RECENT_PROJECTS: usize = 3;

/// Mean rating rounded to one decimal; 0 when there are no reviews.
pub fn average_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: f64 = reviews.iter().map(|r| r.rating).sum();
    (total / reviews.len() as f64 * 10.0).round() / 10.0
}

/// "March 2024"
pub fn month_year(at: &DateTime<Utc>) -> String {
    at.format("%B %Y").to_string()
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedHacker {
    pub id: Id,
    pub name: String,
    pub title: String,
    pub skills: Vec<String>,
    pub rating: f64,
    pub review_count: usize,
    pub available: bool,
    pub image_placeholder: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProject {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReview {
    pub id: Id,
    pub client_name: String,
    pub client_company: Option<String>,
    pub rating: f64,
    pub comment: String,
    pub date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HackerProfile {
    pub id: Id,
    pub name: String,
    pub title: String,
    pub location: String,
    pub hourly_rate: String,
    pub availability: String,
    pub member_since: String,
    pub verified: bool,
    pub rating: f64,
    pub completed_projects: usize,
    pub description: String,
    pub skills: Vec<String>,
    pub certifications: Vec<String>,
    pub recent_projects: Vec<RecentProject>,
    pub reviews: Vec<ProfileReview>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSkillRequest {
    pub skill: Option<String>,
    pub years_experience: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCertificationRequest {
    pub name: Option<String>,
    pub issuer: Option<String>,
    pub date_obtained: Option<DateTime<Utc>>,
}

/// A user that exists and is a hacker, or 404.
pub(crate) async fn load_hacker(storage: &dyn Storage, id: Id) -> ApiResult<User> {
    storage
        .get_user(id)
        .await?
        .filter(|user| user.user_type == UserType::Hacker)
        .ok_or_else(|| ApiError::not_found("Hacker"))
}

async fn skill_names(storage: &dyn Storage, hacker_id: Id) -> ApiResult<Vec<String>> {
    Ok(storage
        .get_hacker_skills(hacker_id)
        .await?
        .into_iter()
        .map(|s| s.skill)
        .collect())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/hackers
pub async fn list_hackers(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.storage.list_users(Some(UserType::Hacker)).await?))
}

/// GET /api/hackers/featured
pub async fn featured_hackers(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<FeaturedHacker>>> {
    let storage = state.storage.as_ref();
    let mut cards = Vec::new();
    for hacker in storage.list_users(Some(UserType::Hacker)).await? {
        let reviews = storage.get_reviews_by_hacker_id(hacker.id).await?;
        cards.push(FeaturedHacker {
            id: hacker.id,
            skills: skill_names(storage, hacker.id).await?,
            rating: average_rating(&reviews),
            review_count: reviews.len(),
            available: true,
            image_placeholder: hacker.initials(),
            title: hacker.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            name: hacker.full_name,
        });
    }
    Ok(Json(cards))
}

/// GET /api/hackers/{id}
pub async fn get_hacker(
    State(state): State<AppState>,
    PathParam(id): PathParam<Id>,
) -> ApiResult<Json<HackerProfile>> {
    let storage = state.storage.as_ref();
    let hacker = load_hacker(storage, id).await?;

    let certifications = storage
        .get_hacker_certifications(id)
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();

    let reviews = storage.get_reviews_by_hacker_id(id).await?;
    let mut profile_reviews = Vec::with_capacity(reviews.len());
    for review in &reviews {
        let client = storage.get_user(review.client_id).await?;
        profile_reviews.push(ProfileReview {
            id: review.id,
            client_name: client
                .as_ref()
                .map(|c| c.full_name.clone())
                .unwrap_or_else(|| "Anonymous".to_string()),
            client_company: client.and_then(|c| c.company),
            rating: review.rating,
            comment: review.comment.clone().unwrap_or_default(),
            date: month_year(&review.created_at),
        });
    }

    let accepted: Vec<_> = storage
        .get_applications_by_hacker_id(id)
        .await?
        .into_iter()
        .filter(|app| app.status == ApplicationStatus::Accepted)
        .collect();

    let mut recent_projects = Vec::new();
    for app in accepted.iter().take(RECENT_PROJECTS) {
        let title = storage
            .get_project(app.project_id)
            .await?
            .map(|p| p.title)
            .unwrap_or_else(|| "Unknown Project".to_string());
        recent_projects.push(RecentProject {
            id: app.project_id,
            title,
            description: app.proposal.clone(),
            date: month_year(&app.created_at),
        });
    }

    Ok(Json(HackerProfile {
        id: hacker.id,
        title: hacker.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        location: hacker.location.unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
        hourly_rate: DEFAULT_HOURLY_RATE.to_string(),
        availability: DEFAULT_AVAILABILITY.to_string(),
        member_since: month_year(&hacker.created_at),
        verified: hacker.is_verified,
        rating: average_rating(&reviews),
        completed_projects: accepted.len(),
        description: hacker.bio.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        skills: skill_names(storage, id).await?,
        certifications,
        recent_projects,
        reviews: profile_reviews,
        name: hacker.full_name,
    }))
}

/// POST /api/hackers/{id}/skills
pub async fn add_skill(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParam(id): PathParam<Id>,
    JsonBody(request): JsonBody<AddSkillRequest>,
) -> ApiResult<(StatusCode, Json<HackerSkill>)> {
    caller.require_self_or_admin(id)?;
    load_hacker(state.storage.as_ref(), id).await?;

    let mut v = Validator::new();
    let skill = v.required("skill", request.skill);
    if let Some(years) = request.years_experience {
        v.check(years >= 0, "yearsExperience", "yearsExperience cannot be negative");
    }
    v.finish()?;

    let skill = state
        .storage
        .add_hacker_skill(NewHackerSkill {
            user_id: id,
            skill,
            years_experience: request.years_experience,
        })
        .await?;
    tracing::info!(hacker_id = id, skill = %skill.skill, "hacker skill added");
    Ok((StatusCode::CREATED, Json(skill)))
}

/// POST /api/hackers/{id}/certifications
pub async fn add_certification(
    State(state): State<AppState>,
    caller: AuthUser,
    PathParam(id): PathParam<Id>,
    JsonBody(request): JsonBody<AddCertificationRequest>,
) -> ApiResult<(StatusCode, Json<HackerCertification>)> {
    caller.require_self_or_admin(id)?;
    load_hacker(state.storage.as_ref(), id).await?;

    let mut v = Validator::new();
    let name = v.required("name", request.name);
    v.finish()?;

    let certification = state
        .storage
        .add_hacker_certification(NewHackerCertification {
            user_id: id,
            name,
            issuer: non_blank(request.issuer),
            date_obtained: request.date_obtained,
        })
        .await?;
    tracing::info!(hacker_id = id, certification = %certification.name, "certification added");
    Ok((StatusCode::CREATED, Json(certification)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use crate::storage::models::{NewApplication, NewProject, NewReview};
    use axum::http::Method;
    use serde_json::json;

    fn review(rating: f64) -> Review {
        Review {
            id: 1,
            project_id: 1,
            client_id: 1,
            hacker_id: 1,
            rating,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[review(5.0), review(4.0), review(3.0)]), 4.0);
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[review(5.0), review(4.0), review(4.0)]), 4.3);
    }

    #[test]
    fn test_month_year() {
        let at = DateTime::parse_from_rfc3339("2024-03-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(month_year(&at), "March 2024");
    }

    async fn add_review(state: &AppState, client_id: Id, hacker_id: Id, rating: f64) {
        state
            .storage
            .create_review(NewReview {
                project_id: 1,
                client_id,
                hacker_id,
                rating,
                comment: Some("Great work".to_string()),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_featured_cards() {
        let state = test_state();
        let neo = create_user(&state, "neo", UserType::Hacker).await;
        let client = create_user(&state, "acme", UserType::Client).await;
        create_user(&state, "trinity", UserType::Hacker).await;
        for rating in [5.0, 4.0, 3.0] {
            add_review(&state, client.id, neo.id, rating).await;
        }

        let (status, json) = send(&state, Method::GET, "/api/hackers/featured", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let cards = json.as_array().unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0]["name"], "Neo Tester");
        assert_eq!(cards[0]["rating"], 4.0);
        assert_eq!(cards[0]["reviewCount"], 3);
        assert_eq!(cards[0]["imagePlaceholder"], "NT");
        assert_eq!(cards[0]["title"], "Security Specialist");
        assert_eq!(cards[1]["rating"], 0.0);
        assert_eq!(cards[1]["reviewCount"], 0);
    }

    #[tokio::test]
    async fn test_profile_aggregate() {
        let state = test_state();
        let neo = create_user(&state, "neo", UserType::Hacker).await;
        let client = create_user(&state, "acme", UserType::Client).await;
        let project = state
            .storage
            .create_project(NewProject {
                client_id: client.id,
                title: "Cloud audit".to_string(),
                description: "d".to_string(),
                requirements: "r".to_string(),
                budget: "b".to_string(),
                timeframe: "t".to_string(),
                additional_details: None,
                status: None,
            })
            .await
            .unwrap();
        let app = state
            .storage
            .create_application(NewApplication {
                project_id: project.id,
                hacker_id: neo.id,
                proposal: "Full AWS review".to_string(),
                estimated_time: "1 week".to_string(),
                price_quote: "$3,000".to_string(),
            })
            .await
            .unwrap();
        state
            .storage
            .update_application(
                app.id,
                crate::storage::models::ApplicationPatch {
                    status: Some(ApplicationStatus::Accepted),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        add_review(&state, client.id, neo.id, 5.0).await;
        add_review(&state, 999, neo.id, 4.0).await;

        let uri = format!("/api/hackers/{}", neo.id);
        let (status, json) = send(&state, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["location"], "Remote");
        assert_eq!(json["hourlyRate"], "$80-120/hr");
        assert_eq!(json["rating"], 4.5);
        assert_eq!(json["completedProjects"], 1);
        assert_eq!(json["recentProjects"][0]["title"], "Cloud audit");
        assert_eq!(json["recentProjects"][0]["description"], "Full AWS review");
        assert_eq!(json["reviews"][0]["clientName"], "Acme Tester");
        assert_eq!(json["reviews"][1]["clientName"], "Anonymous");
        assert!(json["description"].as_str().unwrap().starts_with("Experienced"));
    }

    #[tokio::test]
    async fn test_profile_of_non_hacker_is_not_found() {
        let state = test_state();
        let client = create_user(&state, "acme", UserType::Client).await;
        let uri = format!("/api/hackers/{}", client.id);
        let (status, json) = send(&state, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Hacker not found");
    }

    #[tokio::test]
    async fn test_hacker_manages_own_skills_and_certifications() {
        let state = test_state();
        let neo = create_user(&state, "neo", UserType::Hacker).await;
        let other = create_user(&state, "smith", UserType::Hacker).await;
        let token = token_for(&state, &neo).await;
        let other_token = token_for(&state, &other).await;

        let skills_uri = format!("/api/hackers/{}/skills", neo.id);
        let (status, _) = send(
            &state,
            Method::POST,
            &skills_uri,
            Some(&other_token),
            Some(json!({"skill": "Fuzzing"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) = send(
            &state,
            Method::POST,
            &skills_uri,
            Some(&token),
            Some(json!({"skill": "Fuzzing", "yearsExperience": 4})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["yearsExperience"], 4);

        let certs_uri = format!("/api/hackers/{}/certifications", neo.id);
        let (status, json) = send(
            &state,
            Method::POST,
            &certs_uri,
            Some(&token),
            Some(json!({"name": "OSCP", "issuer": "OffSec", "dateObtained": "2023-06-01T00:00:00Z"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["issuer"], "OffSec");

        let (status, json) = send(
            &state,
            Method::POST,
            &certs_uri,
            Some(&token),
            Some(json!({"issuer": "nobody"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_fields(&json), vec!["name"]);

        let uri = format!("/api/hackers/{}", neo.id);
        let (_, json) = send(&state, Method::GET, &uri, None, None).await;
        assert_eq!(json["skills"], json!(["Fuzzing"]));
        assert_eq!(json["certifications"], json!(["OSCP"]));
    }

    #[tokio::test]
    async fn test_list_hackers_only_returns_hackers() {
        let state = test_state();
        create_user(&state, "neo", UserType::Hacker).await;
        create_user(&state, "acme", UserType::Client).await;
        let (_, json) = send(&state, Method::GET, "/api/hackers", None, None).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["userType"], "hacker");
    }
}
