//! In-memory storage backend.
//!
//! One ordered map per entity type behind a single lock. Ids come from a
//! per-collection counter that only moves forward, so ordering by id is the
//! same as insertion order and deleted ids are never handed out again.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::models::*;
use super::{Storage, StorageError, StorageResult};

struct Collection<T> {
    rows: BTreeMap<Id, T>,
    last_id: Id,
}

impl<T: Clone> Collection<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }

    fn insert_with(&mut self, build: impl FnOnce(Id) -> T) -> T {
        self.last_id += 1;
        let row = build(self.last_id);
        self.rows.insert(self.last_id, row.clone());
        row
    }

    fn get(&self, id: Id) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    /// Linear scan; keeps insertion order.
    fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|row| predicate(row)).cloned().collect()
    }

    fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.rows.values().find(|row| predicate(row)).cloned()
    }

    fn contains(&self, id: Id) -> bool {
        self.rows.contains_key(&id)
    }

    fn update(&mut self, id: Id, apply: impl FnOnce(&mut T)) -> Option<T> {
        let row = self.rows.get_mut(&id)?;
        apply(row);
        Some(row.clone())
    }

    /// Like `update`, but `apply` may refuse the change. It must not mutate
    /// the row before returning an error.
    fn try_update<E>(
        &mut self,
        id: Id,
        apply: impl FnOnce(&mut T) -> Result<(), E>,
    ) -> Result<Option<T>, E> {
        let Some(row) = self.rows.get_mut(&id) else {
            return Ok(None);
        };
        apply(row)?;
        Ok(Some(row.clone()))
    }

    fn remove(&mut self, id: Id) -> bool {
        self.rows.remove(&id).is_some()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

struct Tables {
    users: Collection<User>,
    projects: Collection<Project>,
    project_skills: Collection<ProjectSkill>,
    hacker_skills: Collection<HackerSkill>,
    hacker_certifications: Collection<HackerCertification>,
    reviews: Collection<Review>,
    testimonials: Collection<Testimonial>,
    applications: Collection<Application>,
    contact_messages: Collection<ContactMessage>,
}

fn check_transition<S>(current: S, next: Option<S>, allowed: fn(&S, S) -> bool) -> StorageResult<()>
where
    S: Copy + std::fmt::Display,
{
    match next {
        Some(next) if !allowed(&current, next) => Err(StorageError::InvalidTransition {
            from: current.to_string(),
            to: next.to_string(),
        }),
        _ => Ok(()),
    }
}

impl Tables {
    /// Usernames and emails are unique across users, ignoring ASCII case.
    fn check_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude: Option<Id>,
    ) -> StorageResult<()> {
        let others = || {
            self.users
                .rows
                .values()
                .filter(move |user| Some(user.id) != exclude)
        };
        if let Some(username) = username {
            if others().any(|user| user.username.eq_ignore_ascii_case(username)) {
                return Err(StorageError::Duplicate { what: "Username" });
            }
        }
        if let Some(email) = email {
            if others().any(|user| user.email.eq_ignore_ascii_case(email)) {
                return Err(StorageError::Duplicate { what: "Email" });
            }
        }
        Ok(())
    }

    fn insert_project(&mut self, project: NewProject) -> Project {
        let created_at = Utc::now();
        self.projects.insert_with(|id| Project {
            id,
            client_id: project.client_id,
            title: project.title,
            description: project.description,
            requirements: project.requirements,
            budget: project.budget,
            timeframe: project.timeframe,
            additional_details: project.additional_details,
            status: project.status.unwrap_or_default(),
            created_at,
        })
    }

    fn insert_project_skill(&mut self, skill: NewProjectSkill) -> ProjectSkill {
        self.project_skills.insert_with(|id| ProjectSkill {
            id,
            project_id: skill.project_id,
            skill: skill.skill,
        })
    }
}

/// Process-local repository. Everything is lost on restart.
pub struct MemStorage {
    tables: RwLock<Tables>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                users: Collection::new(),
                projects: Collection::new(),
                project_skills: Collection::new(),
                hacker_skills: Collection::new(),
                hacker_certifications: Collection::new(),
                reviews: Collection::new(),
                testimonials: Collection::new(),
                applications: Collection::new(),
                contact_messages: Collection::new(),
            }),
        }
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemStorage {
    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    async fn get_user(&self, id: Id) -> StorageResult<Option<User>> {
        Ok(self.tables.read().await.users.get(id))
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .find(|user| user.username.eq_ignore_ascii_case(username)))
    }

    async fn get_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.find(|user| user.email.eq_ignore_ascii_case(email)))
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let created_at = Utc::now();
        let mut tables = self.tables.write().await;
        tables.check_unique(Some(&user.username), Some(&user.email), None)?;
        Ok(tables.users.insert_with(|id| User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            user_type: user.user_type,
            full_name: user.full_name,
            company: user.company,
            title: user.title,
            bio: user.bio,
            location: user.location,
            profile_image: user.profile_image,
            is_verified: user.is_verified.unwrap_or(false),
            created_at,
        }))
    }

    async fn list_users(&self, user_type: Option<UserType>) -> StorageResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(match user_type {
            Some(user_type) => tables.users.filter(|user| user.user_type == user_type),
            None => tables.users.all(),
        })
    }

    async fn update_user(&self, id: Id, patch: UserPatch) -> StorageResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains(id) {
            return Ok(None);
        }
        tables.check_unique(patch.username.as_deref(), patch.email.as_deref(), Some(id))?;
        Ok(tables.users.update(id, |user| patch.apply(user)))
    }

    async fn delete_user(&self, id: Id) -> StorageResult<bool> {
        Ok(self.tables.write().await.users.remove(id))
    }

    // ------------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------------

    async fn create_project(&self, project: NewProject) -> StorageResult<Project> {
        Ok(self.tables.write().await.insert_project(project))
    }

    async fn create_project_with_skills(
        &self,
        project: NewProject,
        skills: Vec<String>,
    ) -> StorageResult<(Project, Vec<ProjectSkill>)> {
        let mut tables = self.tables.write().await;
        let project = tables.insert_project(project);
        let skills = skills
            .into_iter()
            .map(|skill| {
                tables.insert_project_skill(NewProjectSkill {
                    project_id: project.id,
                    skill,
                })
            })
            .collect();
        Ok((project, skills))
    }

    async fn get_project(&self, id: Id) -> StorageResult<Option<Project>> {
        Ok(self.tables.read().await.projects.get(id))
    }

    async fn get_projects_by_client_id(&self, client_id: Id) -> StorageResult<Vec<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.filter(|project| project.client_id == client_id))
    }

    async fn list_projects(&self, status: Option<ProjectStatus>) -> StorageResult<Vec<Project>> {
        let tables = self.tables.read().await;
        Ok(match status {
            Some(status) => tables.projects.filter(|project| project.status == status),
            None => tables.projects.all(),
        })
    }

    async fn update_project(&self, id: Id, patch: ProjectPatch) -> StorageResult<Option<Project>> {
        let mut tables = self.tables.write().await;
        tables.projects.try_update(id, |project| {
            check_transition(project.status, patch.status, ProjectStatus::can_transition_to)?;
            patch.apply(project);
            Ok(())
        })
    }

    async fn delete_project(&self, id: Id) -> StorageResult<bool> {
        Ok(self.tables.write().await.projects.remove(id))
    }

    async fn delete_projects(&self, ids: &[Id]) -> StorageResult<usize> {
        let mut tables = self.tables.write().await;
        Ok(ids.iter().filter(|id| tables.projects.remove(**id)).count())
    }

    // ------------------------------------------------------------------------
    // Project skills
    // ------------------------------------------------------------------------

    async fn add_project_skill(&self, skill: NewProjectSkill) -> StorageResult<ProjectSkill> {
        Ok(self.tables.write().await.insert_project_skill(skill))
    }

    async fn get_project_skills(&self, project_id: Id) -> StorageResult<Vec<ProjectSkill>> {
        let tables = self.tables.read().await;
        Ok(tables
            .project_skills
            .filter(|skill| skill.project_id == project_id))
    }

    // ------------------------------------------------------------------------
    // Hacker skills and certifications
    // ------------------------------------------------------------------------

    async fn add_hacker_skill(&self, skill: NewHackerSkill) -> StorageResult<HackerSkill> {
        let mut tables = self.tables.write().await;
        Ok(tables.hacker_skills.insert_with(|id| HackerSkill {
            id,
            user_id: skill.user_id,
            skill: skill.skill,
            years_experience: skill.years_experience,
        }))
    }

    async fn get_hacker_skills(&self, user_id: Id) -> StorageResult<Vec<HackerSkill>> {
        let tables = self.tables.read().await;
        Ok(tables.hacker_skills.filter(|skill| skill.user_id == user_id))
    }

    async fn add_hacker_certification(
        &self,
        certification: NewHackerCertification,
    ) -> StorageResult<HackerCertification> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .hacker_certifications
            .insert_with(|id| HackerCertification {
                id,
                user_id: certification.user_id,
                name: certification.name,
                issuer: certification.issuer,
                date_obtained: certification.date_obtained,
            }))
    }

    async fn get_hacker_certifications(
        &self,
        user_id: Id,
    ) -> StorageResult<Vec<HackerCertification>> {
        let tables = self.tables.read().await;
        Ok(tables
            .hacker_certifications
            .filter(|certification| certification.user_id == user_id))
    }

    // ------------------------------------------------------------------------
    // Reviews
    // ------------------------------------------------------------------------

    async fn create_review(&self, review: NewReview) -> StorageResult<Review> {
        let created_at = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.reviews.insert_with(|id| Review {
            id,
            project_id: review.project_id,
            client_id: review.client_id,
            hacker_id: review.hacker_id,
            rating: review.rating,
            comment: review.comment,
            created_at,
        }))
    }

    async fn get_review(&self, id: Id) -> StorageResult<Option<Review>> {
        Ok(self.tables.read().await.reviews.get(id))
    }

    async fn get_reviews_by_hacker_id(&self, hacker_id: Id) -> StorageResult<Vec<Review>> {
        let tables = self.tables.read().await;
        Ok(tables.reviews.filter(|review| review.hacker_id == hacker_id))
    }

    async fn get_reviews_by_client_id(&self, client_id: Id) -> StorageResult<Vec<Review>> {
        let tables = self.tables.read().await;
        Ok(tables.reviews.filter(|review| review.client_id == client_id))
    }

    // ------------------------------------------------------------------------
    // Testimonials
    // ------------------------------------------------------------------------

    async fn create_testimonial(&self, testimonial: NewTestimonial) -> StorageResult<Testimonial> {
        let mut tables = self.tables.write().await;
        Ok(tables.testimonials.insert_with(|id| Testimonial {
            id,
            review_id: testimonial.review_id,
            is_featured: testimonial.is_featured.unwrap_or(false),
        }))
    }

    async fn list_testimonials(&self) -> StorageResult<Vec<Testimonial>> {
        Ok(self.tables.read().await.testimonials.all())
    }

    async fn get_featured_testimonials(&self) -> StorageResult<Vec<Testimonial>> {
        let tables = self.tables.read().await;
        Ok(tables.testimonials.filter(|testimonial| testimonial.is_featured))
    }

    async fn update_testimonial(
        &self,
        id: Id,
        patch: TestimonialPatch,
    ) -> StorageResult<Option<Testimonial>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .testimonials
            .update(id, |testimonial| patch.apply(testimonial)))
    }

    // ------------------------------------------------------------------------
    // Applications
    // ------------------------------------------------------------------------

    async fn create_application(&self, application: NewApplication) -> StorageResult<Application> {
        let created_at = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.applications.insert_with(|id| Application {
            id,
            project_id: application.project_id,
            hacker_id: application.hacker_id,
            proposal: application.proposal,
            estimated_time: application.estimated_time,
            price_quote: application.price_quote,
            status: ApplicationStatus::Pending,
            created_at,
        }))
    }

    async fn get_application(&self, id: Id) -> StorageResult<Option<Application>> {
        Ok(self.tables.read().await.applications.get(id))
    }

    async fn list_applications(&self) -> StorageResult<Vec<Application>> {
        Ok(self.tables.read().await.applications.all())
    }

    async fn get_applications_by_hacker_id(&self, hacker_id: Id) -> StorageResult<Vec<Application>> {
        let tables = self.tables.read().await;
        Ok(tables.applications.filter(|app| app.hacker_id == hacker_id))
    }

    async fn get_applications_by_project_id(
        &self,
        project_id: Id,
    ) -> StorageResult<Vec<Application>> {
        let tables = self.tables.read().await;
        Ok(tables.applications.filter(|app| app.project_id == project_id))
    }

    async fn update_application(
        &self,
        id: Id,
        patch: ApplicationPatch,
    ) -> StorageResult<Option<Application>> {
        let mut tables = self.tables.write().await;
        tables.applications.try_update(id, |app| {
            check_transition(app.status, patch.status, ApplicationStatus::can_transition_to)?;
            patch.apply(app);
            Ok(())
        })
    }

    // ------------------------------------------------------------------------
    // Contact messages
    // ------------------------------------------------------------------------

    async fn create_contact_message(
        &self,
        message: NewContactMessage,
    ) -> StorageResult<ContactMessage> {
        let created_at = Utc::now();
        let mut tables = self.tables.write().await;
        Ok(tables.contact_messages.insert_with(|id| ContactMessage {
            id,
            name: message.name,
            email: message.email,
            subject: message.subject,
            message: message.message,
            inquiry_type: message.inquiry_type,
            created_at,
            is_read: false,
        }))
    }

    async fn list_contact_messages(&self) -> StorageResult<Vec<ContactMessage>> {
        Ok(self.tables.read().await.contact_messages.all())
    }

    async fn mark_contact_message_as_read(&self, id: Id) -> StorageResult<Option<ContactMessage>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .contact_messages
            .update(id, |message| message.is_read = true))
    }

    async fn stats(&self) -> StorageResult<StorageStats> {
        let tables = self.tables.read().await;
        Ok(StorageStats {
            users: tables.users.len(),
            projects: tables.projects.len(),
            applications: tables.applications.len(),
            reviews: tables.reviews.len(),
            testimonials: tables.testimonials.len(),
            contact_messages: tables.contact_messages.len(),
        })
    }
}
