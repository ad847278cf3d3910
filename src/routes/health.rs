/**
 * Health Routes
 * Liveness, detailed status with a storage round-trip, and readiness
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::storage::models::StorageStats;
use crate::storage::{Storage, StorageError};
use crate::AppState;

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Single service check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    pub storage: ServiceCheck,
}

/// Detailed health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    pub environment: String,
    pub active_sessions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<StorageStats>,
    pub checks: HealthChecks,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

async fn probe_storage(storage: &dyn Storage) -> (Result<StorageStats, StorageError>, Duration) {
    let started = Instant::now();
    let result = storage.stats().await;
    (result, started.elapsed())
}

/// GET /health, GET /api/health
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/detailed
pub async fn health_detailed(State(state): State<AppState>) -> impl IntoResponse {
    let (result, elapsed) = probe_storage(state.storage.as_ref()).await;
    let (storage_check, counts) = match result {
        Ok(stats) => (
            ServiceCheck {
                status: "healthy".to_string(),
                response_time: Some(elapsed.as_millis() as u64),
                error: None,
            },
            Some(stats),
        ),
        Err(e) => {
            tracing::error!(error = %e, "storage health check failed");
            (
                ServiceCheck {
                    status: "unhealthy".to_string(),
                    response_time: None,
                    error: Some(e.to_string()),
                },
                None,
            )
        }
    };

    Json(DetailedHealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        uptime: SERVER_START.elapsed().as_secs(),
        environment: state.config.environment.clone(),
        active_sessions: state.sessions.active_count().await,
        counts,
        checks: HealthChecks {
            storage: storage_check,
        },
    })
}

/// GET /health/ready
/// 503 while storage cannot be reached.
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let (result, _) = probe_storage(state.storage.as_ref()).await;
    let (code, status, reason) = match result {
        Ok(_) => (StatusCode::OK, "ready", None),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "not ready",
            Some(format!("storage unavailable: {}", e)),
        ),
    };

    (
        code,
        Json(ReadyResponse {
            status: status.to_string(),
            timestamp: Utc::now(),
            uptime: SERVER_START.elapsed().as_secs(),
            reason,
        }),
    )
}
