//! Storage Models - entities held by the repository, plus the insert and
//! patch shapes used to create and shallow-merge them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier type shared by every entity collection.
pub type Id = i32;

/// Returned when a status/type string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}', expected one of: {allowed}")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
    pub allowed: String,
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseVariantError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseVariantError {
                        kind: $kind,
                        value: other.to_string(),
                        allowed: [$($text),+].join(", "),
                    }),
                }
            }
        }
    };
}

// ============================================================================
// Enumerations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Client,
    Hacker,
    Admin,
}

string_enum!(UserType, "user type", {
    Client => "client",
    Hacker => "hacker",
    Admin => "admin",
});

/// Project lifecycle. `completed` and `canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Canceled,
}

string_enum!(ProjectStatus, "project status", {
    Open => "open",
    InProgress => "in-progress",
    Completed => "completed",
    Canceled => "canceled",
});

impl ProjectStatus {
    /// Re-setting the current status is always allowed.
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        use ProjectStatus::*;
        *self == next
            || matches!(
                (self, next),
                (Open, InProgress) | (Open, Canceled) | (InProgress, Completed) | (InProgress, Canceled)
            )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

string_enum!(ApplicationStatus, "application status", {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
});

impl ApplicationStatus {
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        *self == next || (*self == ApplicationStatus::Pending && next != ApplicationStatus::Pending)
    }
}

// ============================================================================
// Users
// ============================================================================

/// Marketplace account: client, hacker or admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub email: String,
    pub user_type: UserType,
    pub full_name: String,
    pub company: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub profile_image: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// First letter of each name part, e.g. "Ada Lovelace" -> "AL".
    pub fn initials(&self) -> String {
        self.full_name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .collect()
    }

    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub user_type: UserType,
    pub full_name: String,
    pub company: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub profile_image: Option<String>,
    pub is_verified: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub email: Option<String>,
    pub user_type: Option<UserType>,
    pub full_name: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub profile_image: Option<String>,
    pub is_verified: Option<bool>,
}

impl UserPatch {
    pub fn apply(self, user: &mut User) {
        merge(&mut user.username, self.username);
        merge(&mut user.password_hash, self.password_hash);
        merge(&mut user.email, self.email);
        merge(&mut user.user_type, self.user_type);
        merge(&mut user.full_name, self.full_name);
        merge_nullable(&mut user.company, self.company);
        merge_nullable(&mut user.title, self.title);
        merge_nullable(&mut user.bio, self.bio);
        merge_nullable(&mut user.location, self.location);
        merge_nullable(&mut user.profile_image, self.profile_image);
        merge(&mut user.is_verified, self.is_verified);
    }
}

// ============================================================================
// Projects
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Id,
    pub client_id: Id,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub budget: String,
    pub timeframe: String,
    pub additional_details: Option<String>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub client_id: Id,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub budget: String,
    pub timeframe: String,
    pub additional_details: Option<String>,
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub budget: Option<String>,
    pub timeframe: Option<String>,
    pub additional_details: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl ProjectPatch {
    pub fn apply(self, project: &mut Project) {
        merge(&mut project.title, self.title);
        merge(&mut project.description, self.description);
        merge(&mut project.requirements, self.requirements);
        merge(&mut project.budget, self.budget);
        merge(&mut project.timeframe, self.timeframe);
        merge_nullable(&mut project.additional_details, self.additional_details);
        merge(&mut project.status, self.status);
    }
}

/// Skill tag attached to a project. Duplicates are not rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSkill {
    pub id: Id,
    pub project_id: Id,
    pub skill: String,
}

#[derive(Debug, Clone)]
pub struct NewProjectSkill {
    pub project_id: Id,
    pub skill: String,
}

// ============================================================================
// Hacker profile associations
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HackerSkill {
    pub id: Id,
    pub user_id: Id,
    pub skill: String,
    pub years_experience: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewHackerSkill {
    pub user_id: Id,
    pub skill: String,
    pub years_experience: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HackerCertification {
    pub id: Id,
    pub user_id: Id,
    pub name: String,
    pub issuer: Option<String>,
    pub date_obtained: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewHackerCertification {
    pub user_id: Id,
    pub name: String,
    pub issuer: Option<String>,
    pub date_obtained: Option<DateTime<Utc>>,
}

// ============================================================================
// Reviews and testimonials
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Id,
    pub project_id: Id,
    pub client_id: Id,
    pub hacker_id: Id,
    pub rating: f64,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub project_id: Id,
    pub client_id: Id,
    pub hacker_id: Id,
    pub rating: f64,
    pub comment: Option<String>,
}

/// Curated pointer to a review shown on the homepage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: Id,
    pub review_id: Id,
    pub is_featured: bool,
}

#[derive(Debug, Clone)]
pub struct NewTestimonial {
    pub review_id: Id,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct TestimonialPatch {
    pub is_featured: Option<bool>,
}

impl TestimonialPatch {
    pub fn apply(self, testimonial: &mut Testimonial) {
        merge(&mut testimonial.is_featured, self.is_featured);
    }
}

// ============================================================================
// Applications
// ============================================================================

/// A hacker's bid on a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Id,
    pub project_id: Id,
    pub hacker_id: Id,
    pub proposal: String,
    pub estimated_time: String,
    pub price_quote: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub project_id: Id,
    pub hacker_id: Id,
    pub proposal: String,
    pub estimated_time: String,
    pub price_quote: String,
}

#[derive(Debug, Clone, Default)]
pub struct ApplicationPatch {
    pub proposal: Option<String>,
    pub estimated_time: Option<String>,
    pub price_quote: Option<String>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationPatch {
    pub fn apply(self, application: &mut Application) {
        merge(&mut application.proposal, self.proposal);
        merge(&mut application.estimated_time, self.estimated_time);
        merge(&mut application.price_quote, self.price_quote);
        merge(&mut application.status, self.status);
    }
}

// ============================================================================
// Contact messages
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub inquiry_type: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub inquiry_type: String,
}

/// Entity counts, reported by the health endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub users: usize,
    pub projects: usize,
    pub applications: usize,
    pub reviews: usize,
    pub testimonials: usize,
    pub contact_messages: usize,
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn merge_nullable<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_status_serializes_kebab_case() {
        let s = serde_json::to_string(&ProjectStatus::InProgress).unwrap();
        assert_eq!(s, "\"in-progress\"");
        assert_eq!("in-progress".parse::<ProjectStatus>().unwrap(), ProjectStatus::InProgress);
    }

    #[test]
    fn test_unknown_user_type_lists_allowed_values() {
        let err = "superuser".parse::<UserType>().unwrap_err();
        assert_eq!(err.value, "superuser");
        assert!(err.to_string().contains("client, hacker, admin"));
    }

    #[test]
    fn test_project_transitions() {
        use ProjectStatus::*;
        assert!(Open.can_transition_to(InProgress));
        assert!(Open.can_transition_to(Canceled));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Canceled));
        assert!(Completed.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Open));
        assert!(!Canceled.can_transition_to(InProgress));
        assert!(!Open.can_transition_to(Completed));
    }

    #[test]
    fn test_application_transitions_are_terminal() {
        use ApplicationStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Pending));
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let user = User {
            id: 1,
            username: "ada".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            email: "ada@example.com".to_string(),
            user_type: UserType::Hacker,
            full_name: "Ada Lovelace".to_string(),
            company: None,
            title: None,
            bio: None,
            location: None,
            profile_image: None,
            is_verified: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["userType"], "hacker");
        assert_eq!(json["fullName"], "Ada Lovelace");
        assert_eq!(user.initials(), "AL");
    }
}
