//! HackerHire Backend - library for app logic and testing

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod seed;
pub mod storage;
pub mod validation;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use auth::SessionStore;
use config::AppConfig;
use storage::{MemStorage, Storage};

/// Shared handler state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub sessions: Arc<SessionStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: AppConfig) -> Self {
        Self {
            storage,
            sessions: Arc::new(SessionStore::new()),
            config: Arc::new(config),
        }
    }
}

/// CORS for the configured origins. Origins that are not valid header
/// values are skipped with a warning.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config);
    let body_limit = state.config.max_body_bytes;

    Router::new()
        // Auth
        .route("/api/auth/signup", post(routes::auth::signup))
        .route("/api/auth/login", post(routes::auth::login))
        .route(
            "/api/auth/logout",
            get(routes::auth::logout).post(routes::auth::logout),
        )
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/user", get(routes::auth::me))
        .route("/api/user/profile", patch(routes::auth::update_profile))
        .route("/api/user/password", patch(routes::auth::change_password))
        .route("/api/admin/login", post(routes::auth::admin_login))
        .route("/api/admin/create", post(routes::auth::admin_create))
        // Users
        .route(
            "/api/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/api/users/{id}",
            get(routes::users::get_user)
                .patch(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        // Projects
        .route(
            "/api/projects",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/api/projects/bulk-delete",
            post(routes::projects::bulk_delete_projects),
        )
        .route(
            "/api/projects/{id}",
            get(routes::projects::get_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/api/projects/{id}/applications",
            get(routes::applications::list_project_applications),
        )
        .route(
            "/api/clients/{id}/projects",
            get(routes::projects::list_client_projects),
        )
        // Hackers
        .route("/api/hackers", get(routes::hackers::list_hackers))
        .route("/api/hackers/featured", get(routes::hackers::featured_hackers))
        .route("/api/hackers/{id}", get(routes::hackers::get_hacker))
        .route("/api/hackers/{id}/skills", post(routes::hackers::add_skill))
        .route(
            "/api/hackers/{id}/certifications",
            post(routes::hackers::add_certification),
        )
        // Applications and reviews
        .route(
            "/api/applications",
            get(routes::applications::list_applications)
                .post(routes::applications::create_application),
        )
        .route(
            "/api/applications/{id}",
            patch(routes::applications::decide_application),
        )
        .route("/api/reviews", post(routes::reviews::create_review))
        .route(
            "/api/reviews/hacker/{id}",
            get(routes::reviews::list_hacker_reviews),
        )
        // Testimonials
        .route(
            "/api/testimonials",
            get(routes::testimonials::list_testimonials)
                .post(routes::testimonials::create_testimonial),
        )
        .route(
            "/api/testimonials/{id}",
            patch(routes::testimonials::update_testimonial),
        )
        // Dashboard
        .route(
            "/api/client/dashboard",
            get(routes::dashboard::client_dashboard),
        )
        // Contact
        .route("/api/contact", post(routes::contact::submit_contact))
        .route(
            "/api/contact-messages",
            get(routes::contact::list_messages),
        )
        .route(
            "/api/contact-messages/{id}/read",
            patch(routes::contact::mark_read),
        )
        // Health
        .route("/api/health", get(routes::health::health_ping))
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/ready", get(routes::health::health_ready))
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;

    // Held until `run` returns; dropping them stops the log writer threads.
    let _log_guards = logging::init(&config.log);

    config.validate().context("refusing to start")?;
    routes::health::init_start_time();

    let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
    if config.seed_admins {
        let seeded = seed::seed_admins(storage.as_ref(), &config)
            .await
            .context("failed to seed admin accounts")?;
        tracing::info!(count = seeded.len(), "admin accounts seeded");
    }

    let addr = config.socket_addr()?;
    let state = AppState::new(storage, config);
    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
