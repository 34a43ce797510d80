/*!
 * # Health Check Module
 *
 * Endpoints for monitoring the booking API:
 *
 * - Basic health check (`/health`) - cached up/down status
 * - Readiness check (`/health/ready`) - pings the database before answering
 * - Liveness check (`/health/live`) - the process is running
 * - Detailed health check (`/health/details`) - per-component status
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::db;

/// Basic health status
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
    Degraded,
}

/// Health check detail
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthDetail {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Overall health information
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub details: HashMap<String, HealthDetail>,
}

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub db_pool: Arc<DatabaseConnection>,
    pub health_cache: Arc<RwLock<HealthInfo>>,
    pub start_time: SystemTime,
}

impl HealthState {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self {
            db_pool,
            health_cache: Arc::new(RwLock::new(HealthInfo {
                status: HealthStatus::Up,
                version: env!("CARGO_PKG_VERSION").to_string(),
                timestamp: Utc::now(),
                uptime_seconds: 0,
                details: HashMap::new(),
            })),
            start_time: SystemTime::now(),
        }
    }

    /// Calculate system uptime
    pub fn uptime(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::from_secs(0))
            .as_secs()
    }

    /// Re-checks every component and recomputes the overall status
    pub async fn update_health(&self) {
        let database = match db::check_connection(&self.db_pool).await {
            Ok(()) => HealthDetail {
                status: HealthStatus::Up,
                message: None,
                timestamp: Utc::now(),
            },
            Err(e) => HealthDetail {
                status: HealthStatus::Down,
                message: Some(e.response_message()),
                timestamp: Utc::now(),
            },
        };

        let mut health = self.health_cache.write().await;
        health.timestamp = Utc::now();
        health.uptime_seconds = self.uptime();
        health.details.insert("database".to_string(), database);

        let any_down = health
            .details
            .values()
            .any(|detail| detail.status == HealthStatus::Down);
        let any_degraded = health
            .details
            .values()
            .any(|detail| detail.status == HealthStatus::Degraded);

        health.status = if any_down {
            HealthStatus::Down
        } else if any_degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Up
        };
    }
}

fn status_code_for(status: &HealthStatus) -> StatusCode {
    match status {
        HealthStatus::Up | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Returns build and version information
pub async fn version_info() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("GIT_HASH").unwrap_or("unknown"),
        "built": option_env!("BUILD_TIME").unwrap_or("unknown"),
    }))
}

/// Basic health check endpoint
pub async fn health_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    debug!("Health check endpoint called");
    let health = state.health_cache.read().await;

    (
        status_code_for(&health.status),
        Json(json!({
            "status": health.status,
            "version": health.version,
            "timestamp": health.timestamp,
        })),
    )
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    state.update_health().await;
    let health = state.health_cache.read().await;

    (
        status_code_for(&health.status),
        Json(json!({
            "ready": health.status == HealthStatus::Up,
            "timestamp": health.timestamp,
        })),
    )
}

/// Liveness check endpoint
pub async fn liveness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "alive": true,
            "uptime_seconds": state.uptime(),
            "timestamp": Utc::now(),
        })),
    )
}

/// Detailed health check endpoint
pub async fn detailed_health(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    state.update_health().await;
    let health = state.health_cache.read().await;

    (status_code_for(&health.status), Json(health.clone()))
}

/// Run periodic health checks
pub async fn run_health_checker(state: Arc<HealthState>, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;
        state.update_health().await;

        let health = state.health_cache.read().await;
        if health.status != HealthStatus::Up {
            warn!("System health is not optimal: {:?}", health.status);

            for (name, detail) in &health.details {
                if detail.status != HealthStatus::Up {
                    warn!("Component {name} is not healthy: {:?}", detail.status);
                }
            }
        }
    }
}

/// Health routes, meant to be nested under `/health`
pub fn health_routes<S>(state: Arc<HealthState>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
        .route("/details", get(detailed_health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    async fn state() -> Arc<HealthState> {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        Arc::new(HealthState::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn readiness_reports_database_up() {
        let state = state().await;
        let response = health_routes::<()>(state.clone())
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let health = state.health_cache.read().await;
        assert_eq!(health.details["database"].status, HealthStatus::Up);
    }

    #[tokio::test]
    async fn liveness_is_always_ok() {
        let response = health_routes::<()>(state().await)
            .oneshot(Request::get("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
