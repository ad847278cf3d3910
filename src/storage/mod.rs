//! Storage Module
//! Repository trait consumed by the route layer, and its in-memory backend.

pub mod memory;
pub mod models;

use async_trait::async_trait;

pub use memory::MemStorage;
use models::*;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Username or email already held by another user. `what` is the
    /// capitalised field label.
    #[error("{what} already exists")]
    Duplicate { what: &'static str },

    /// A status patch that does not follow the entity's lifecycle.
    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Backend failure. The in-memory store never produces one; a persistent
    /// backend reports connection or query faults through it.
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// CRUD and relationship-resolution operations for every marketplace entity.
///
/// Missing rows are reported as `Ok(None)` / `Ok(false)`, never as errors.
/// List operations return entities in insertion order.
#[async_trait]
pub trait Storage: Send + Sync {
    // Users
    async fn get_user(&self, id: Id) -> StorageResult<Option<User>>;
    /// Case-insensitive.
    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;
    /// Case-insensitive.
    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;
    /// Fails with [`StorageError::Duplicate`] when the username or email is
    /// taken (case-insensitive). The check and the insert are atomic.
    async fn create_user(&self, user: NewUser) -> StorageResult<User>;
    async fn list_users(&self, user_type: Option<UserType>) -> StorageResult<Vec<User>>;
    /// Same uniqueness rule as `create_user`, ignoring the user being updated.
    async fn update_user(&self, id: Id, patch: UserPatch) -> StorageResult<Option<User>>;
    async fn delete_user(&self, id: Id) -> StorageResult<bool>;

    // Projects
    async fn create_project(&self, project: NewProject) -> StorageResult<Project>;
    /// Inserts the project and its skills as one unit: no other operation can
    /// observe the project without its skills.
    async fn create_project_with_skills(
        &self,
        project: NewProject,
        skills: Vec<String>,
    ) -> StorageResult<(Project, Vec<ProjectSkill>)>;
    async fn get_project(&self, id: Id) -> StorageResult<Option<Project>>;
    async fn get_projects_by_client_id(&self, client_id: Id) -> StorageResult<Vec<Project>>;
    async fn list_projects(&self, status: Option<ProjectStatus>) -> StorageResult<Vec<Project>>;
    /// A patched status must be reachable from the stored one
    /// ([`ProjectStatus::can_transition_to`]), checked atomically with the write;
    /// otherwise [`StorageError::InvalidTransition`].
    async fn update_project(&self, id: Id, patch: ProjectPatch) -> StorageResult<Option<Project>>;
    /// Does not remove the project's skills, applications or reviews.
    async fn delete_project(&self, id: Id) -> StorageResult<bool>;
    /// Returns how many of `ids` existed and were removed.
    async fn delete_projects(&self, ids: &[Id]) -> StorageResult<usize>;

    // Project skills
    async fn add_project_skill(&self, skill: NewProjectSkill) -> StorageResult<ProjectSkill>;
    async fn get_project_skills(&self, project_id: Id) -> StorageResult<Vec<ProjectSkill>>;

    // Hacker skills and certifications
    async fn add_hacker_skill(&self, skill: NewHackerSkill) -> StorageResult<HackerSkill>;
    async fn get_hacker_skills(&self, user_id: Id) -> StorageResult<Vec<HackerSkill>>;
    async fn add_hacker_certification(
        &self,
        certification: NewHackerCertification,
    ) -> StorageResult<HackerCertification>;
    async fn get_hacker_certifications(&self, user_id: Id)
        -> StorageResult<Vec<HackerCertification>>;

    // Reviews
    async fn create_review(&self, review: NewReview) -> StorageResult<Review>;
    async fn get_review(&self, id: Id) -> StorageResult<Option<Review>>;
    async fn get_reviews_by_hacker_id(&self, hacker_id: Id) -> StorageResult<Vec<Review>>;
    async fn get_reviews_by_client_id(&self, client_id: Id) -> StorageResult<Vec<Review>>;

    // Testimonials
    async fn create_testimonial(&self, testimonial: NewTestimonial) -> StorageResult<Testimonial>;
    async fn list_testimonials(&self) -> StorageResult<Vec<Testimonial>>;
    async fn get_featured_testimonials(&self) -> StorageResult<Vec<Testimonial>>;
    async fn update_testimonial(
        &self,
        id: Id,
        patch: TestimonialPatch,
    ) -> StorageResult<Option<Testimonial>>;

    // Applications
    /// Always stored as `pending`.
    async fn create_application(&self, application: NewApplication) -> StorageResult<Application>;
    async fn get_application(&self, id: Id) -> StorageResult<Option<Application>>;
    async fn list_applications(&self) -> StorageResult<Vec<Application>>;
    async fn get_applications_by_hacker_id(&self, hacker_id: Id) -> StorageResult<Vec<Application>>;
    async fn get_applications_by_project_id(&self, project_id: Id)
        -> StorageResult<Vec<Application>>;
    /// Status changes follow [`ApplicationStatus::can_transition_to`] like
    /// `update_project`.
    async fn update_application(
        &self,
        id: Id,
        patch: ApplicationPatch,
    ) -> StorageResult<Option<Application>>;

    // Contact messages
    async fn create_contact_message(&self, message: NewContactMessage)
        -> StorageResult<ContactMessage>;
    async fn list_contact_messages(&self) -> StorageResult<Vec<ContactMessage>>;
    async fn mark_contact_message_as_read(&self, id: Id) -> StorageResult<Option<ContactMessage>>;

    async fn stats(&self) -> StorageResult<StorageStats>;
}
