/**
 * Client Dashboard
 * Summary stats, active project cards and activity notifications, all
 * recomputed from the client's projects and their applications
 */
use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::storage::models::{Application, ApplicationStatus, Id, Project, ProjectStatus, UserType};
use crate::AppState;

const ACTIVE_PROJECT_CARDS: usize = 3;
const NOTIFICATION_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
pub struct DashboardUser {
    pub name: String,
    pub company: String,
    pub email: String,
    pub avatar: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_projects: usize,
    pub completed_projects: usize,
    pub pending_reports: usize,
    pub security_score: u32,
}

#[derive(Debug, Serialize)]
pub struct AssignedHacker {
    pub id: Id,
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCard {
    pub id: Id,
    pub title: String,
    pub status: String,
    pub progress: u32,
    pub hacker: AssignedHacker,
    pub due_date: String,
    pub budget: String,
}

#[derive(Debug, Serialize)]
pub struct Notification {
    pub id: String,
    pub message: String,
    pub time: String,
    pub read: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub user: DashboardUser,
    pub stats: DashboardStats,
    pub active_projects: Vec<ProjectCard>,
    pub notifications: Vec<Notification>,
}

/// Completion estimate: open 0, completed 100, in progress 5 per day since
/// posting clamped to 10..=90.
pub fn progress(project: &Project, now: DateTime<Utc>) -> u32 {
    match project.status {
        ProjectStatus::Open | ProjectStatus::Canceled => 0,
        ProjectStatus::Completed => 100,
        ProjectStatus::InProgress => {
            let days = (now - project.created_at).num_days().max(0);
            (days * 5).clamp(10, 90) as u32
        }
    }
}

pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - then;
    let (amount, unit) = if elapsed < Duration::minutes(1) {
        return "just now".to_string();
    } else if elapsed < Duration::hours(1) {
        (elapsed.num_minutes(), "minute")
    } else if elapsed < Duration::days(1) {
        (elapsed.num_hours(), "hour")
    } else {
        (elapsed.num_days(), "day")
    };
    format!("{} {}{} ago", amount, unit, if amount == 1 { "" } else { "s" })
}

pub fn compute_stats(projects: &[(Project, Vec<Application>)]) -> DashboardStats {
    let count = |status: ProjectStatus| {
        projects
            .iter()
            .filter(|(p, _)| p.status == status)
            .count()
    };
    let active_projects = count(ProjectStatus::InProgress);
    let completed_projects = count(ProjectStatus::Completed);
    let pending_reports = projects
        .iter()
        .filter(|(_, apps)| apps.iter().any(|a| a.status == ApplicationStatus::Pending))
        .count();
    let score = completed_projects * 20 + active_projects * 10;
    DashboardStats {
        active_projects,
        completed_projects,
        pending_reports,
        security_score: score.min(100) as u32,
    }
}

/// GET /api/client/dashboard
pub async fn client_dashboard(
    State(state): State<AppState>,
    AuthUser(client): AuthUser,
) -> ApiResult<Json<DashboardResponse>> {
    if client.user_type != UserType::Client {
        return Err(ApiError::Forbidden(
            "Access denied. Only clients can view this dashboard.".to_string(),
        ));
    }

    let storage = state.storage.as_ref();
    let now = Utc::now();

    let mut projects = Vec::new();
    for project in storage.get_projects_by_client_id(client.id).await? {
        let apps = storage.get_applications_by_project_id(project.id).await?;
        projects.push((project, apps));
    }

    let mut active_projects = Vec::new();
    for (project, apps) in projects
        .iter()
        .filter(|(p, _)| matches!(p.status, ProjectStatus::InProgress | ProjectStatus::Open))
        .take(ACTIVE_PROJECT_CARDS)
    {
        let assigned = apps
            .iter()
            .find(|a| a.status == ApplicationStatus::Accepted)
            .or_else(|| apps.first());
        let hacker = match assigned {
            Some(app) => storage.get_user(app.hacker_id).await?,
            None => None,
        };
        active_projects.push(ProjectCard {
            id: project.id,
            title: project.title.clone(),
            status: match project.status {
                ProjectStatus::InProgress => "In Progress",
                _ => "Just Started",
            }
            .to_string(),
            progress: progress(project, now),
            hacker: match hacker {
                Some(h) => AssignedHacker {
                    id: h.id,
                    avatar: h.initials(),
                    name: h.full_name,
                },
                None => AssignedHacker {
                    id: 0,
                    name: "Not Assigned".to_string(),
                    avatar: "NA".to_string(),
                },
            },
            due_date: project.timeframe.clone(),
            budget: project.budget.clone(),
        });
    }

    let window_start = now - Duration::days(NOTIFICATION_WINDOW_DAYS);
    let mut notifications = Vec::new();
    for (project, apps) in &projects {
        for app in apps.iter().filter(|a| a.created_at > window_start) {
            notifications.push(Notification {
                id: format!("application-{}", app.id),
                message: format!("New application received for {}", project.title),
                time: relative_time(app.created_at, now),
                read: false,
            });
        }
    }
    for (project, _) in projects
        .iter()
        .filter(|(p, _)| p.status == ProjectStatus::InProgress)
    {
        notifications.push(Notification {
            id: format!("status-{}", project.id),
            message: format!("Project \"{}\" is in progress", project.title),
            time: "Recently updated".to_string(),
            read: false,
        });
    }

    let stats = compute_stats(&projects);
    Ok(Json(DashboardResponse {
        user: DashboardUser {
            avatar: client.initials(),
            company: client.company.unwrap_or_else(|| "Company".to_string()),
            name: client.full_name,
            email: client.email,
        },
        stats,
        active_projects,
        notifications,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use crate::storage::models::{ApplicationPatch, NewApplication, NewProject, ProjectPatch};
    use axum::http::{Method, StatusCode};

    fn project(status: ProjectStatus, created_at: DateTime<Utc>) -> Project {
        Project {
            id: 1,
            client_id: 1,
            title: "t".to_string(),
            description: "d".to_string(),
            requirements: "r".to_string(),
            budget: "b".to_string(),
            timeframe: "2 weeks".to_string(),
            additional_details: None,
            status,
            created_at,
        }
    }

    fn app(status: ApplicationStatus) -> Application {
        Application {
            id: 1,
            project_id: 1,
            hacker_id: 2,
            proposal: "p".to_string(),
            estimated_time: "e".to_string(),
            price_quote: "q".to_string(),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress() {
        let now = Utc::now();
        assert_eq!(progress(&project(ProjectStatus::Open, now), now), 0);
        assert_eq!(progress(&project(ProjectStatus::Completed, now), now), 100);
        assert_eq!(progress(&project(ProjectStatus::InProgress, now), now), 10);
        let started = now - Duration::days(4);
        assert_eq!(progress(&project(ProjectStatus::InProgress, started), now), 20);
        let long_ago = now - Duration::days(60);
        assert_eq!(progress(&project(ProjectStatus::InProgress, long_ago), now), 90);
    }

    #[test]
    fn test_relative_time() {
        let now = Utc::now();
        assert_eq!(relative_time(now, now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_time(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(relative_time(now - Duration::days(2), now), "2 days ago");
    }

    #[test]
    fn test_security_score_is_capped() {
        let now = Utc::now();
        let mut projects: Vec<(Project, Vec<Application>)> = (0..6)
            .map(|_| (project(ProjectStatus::Completed, now), vec![]))
            .collect();
        projects.push((
            project(ProjectStatus::InProgress, now),
            vec![app(ApplicationStatus::Pending)],
        ));
        projects.push((
            project(ProjectStatus::Open, now),
            vec![app(ApplicationStatus::Rejected)],
        ));
        assert_eq!(
            compute_stats(&projects),
            DashboardStats {
                active_projects: 1,
                completed_projects: 6,
                pending_reports: 1,
                security_score: 100,
            }
        );
        assert_eq!(compute_stats(&[]).security_score, 0);
    }

    #[tokio::test]
    async fn test_dashboard_is_client_only() {
        let state = test_state();
        let (status, _) = send(&state, Method::GET, "/api/client/dashboard", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let hacker = create_user(&state, "neo", UserType::Hacker).await;
        let token = token_for(&state, &hacker).await;
        let (status, _) =
            send(&state, Method::GET, "/api/client/dashboard", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_dashboard_assembles_cards_and_notifications() {
        let state = test_state();
        let client = create_user(&state, "acme", UserType::Client).await;
        let hacker = create_user(&state, "neo", UserType::Hacker).await;

        let mut ids = Vec::new();
        for title in ["Web", "Cloud", "Mobile", "IoT"] {
            let project = state
                .storage
                .create_project(NewProject {
                    client_id: client.id,
                    title: title.to_string(),
                    description: "d".to_string(),
                    requirements: "r".to_string(),
                    budget: "$5,000".to_string(),
                    timeframe: "3 weeks".to_string(),
                    additional_details: None,
                    status: None,
                })
                .await
                .unwrap();
            ids.push(project.id);
        }
        state
            .storage
            .update_project(
                ids[0],
                ProjectPatch {
                    status: Some(ProjectStatus::InProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let application = state
            .storage
            .create_application(NewApplication {
                project_id: ids[0],
                hacker_id: hacker.id,
                proposal: "p".to_string(),
                estimated_time: "e".to_string(),
                price_quote: "q".to_string(),
            })
            .await
            .unwrap();
        state
            .storage
            .update_application(
                application.id,
                ApplicationPatch {
                    status: Some(ApplicationStatus::Accepted),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        state
            .storage
            .create_application(NewApplication {
                project_id: ids[1],
                hacker_id: hacker.id,
                proposal: "p".to_string(),
                estimated_time: "e".to_string(),
                price_quote: "q".to_string(),
            })
            .await
            .unwrap();

        let token = token_for(&state, &client).await;
        let (status, json) =
            send(&state, Method::GET, "/api/client/dashboard", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(json["user"]["name"], "Acme Tester");
        assert_eq!(json["user"]["company"], "Company");
        assert_eq!(json["user"]["avatar"], "AT");

        assert_eq!(json["stats"]["activeProjects"], 1);
        assert_eq!(json["stats"]["completedProjects"], 0);
        assert_eq!(json["stats"]["pendingReports"], 1);
        assert_eq!(json["stats"]["securityScore"], 10);

        let cards = json["activeProjects"].as_array().unwrap();
        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0]["status"], "In Progress");
        assert_eq!(cards[0]["progress"], 10);
        assert_eq!(cards[0]["hacker"]["name"], "Neo Tester");
        assert_eq!(cards[0]["dueDate"], "3 weeks");
        assert_eq!(cards[1]["status"], "Just Started");
        assert_eq!(cards[1]["hacker"]["name"], "Neo Tester");
        assert_eq!(cards[2]["hacker"]["name"], "Not Assigned");
        assert_eq!(cards[2]["hacker"]["id"], 0);

        let notifications = json["notifications"].as_array().unwrap();
        assert_eq!(notifications.len(), 3);
        assert_eq!(notifications[0]["message"], "New application received for Web");
        assert_eq!(notifications[0]["time"], "just now");
        assert_eq!(notifications[2]["id"], format!("status-{}", ids[0]));
    }
}
