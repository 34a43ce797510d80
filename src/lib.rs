//! Bookings API Library
//!
//! Service points, their working hours and posts, schedule slot generation
//! and the booking lifecycle, served over axum and persisted with sea-orm.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Wires every service over one connection pool and event channel.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Arc<events::EventSender>,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), event_sender.clone(), &config);
        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

// Common response wrappers
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-err"), async {
                ApiResponse::<()>::error("oops".into())
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!response.success);
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// All `/api/v1` routes.
pub fn api_v1_routes() -> Router<AppState> {
    use handlers::{bookings, partners, schedules, service_points, services, statuses};

    let partners = Router::new()
        .route(
            "/",
            get(partners::list_partners).post(partners::create_partner),
        )
        .route(
            "/:id",
            get(partners::get_partner)
                .put(partners::update_partner)
                .delete(partners::delete_partner),
        )
        .route(
            "/:id/service-points",
            get(partners::list_partner_service_points),
        );

    let service_points = Router::new()
        .route(
            "/",
            get(service_points::list_service_points).post(service_points::create_service_point),
        )
        .route(
            "/:id",
            get(service_points::get_service_point)
                .put(service_points::update_service_point)
                .delete(service_points::delete_service_point),
        )
        .route(
            "/:id/status",
            put(service_points::change_service_point_status),
        )
        .route("/:id/restore", post(service_points::restore_service_point))
        .route(
            "/:id/working-hours",
            get(service_points::get_working_hours).put(service_points::replace_working_hours),
        )
        .route(
            "/:id/posts",
            get(service_points::list_posts).post(service_points::create_post),
        )
        .route(
            "/:id/posts/:post_id",
            put(service_points::update_post).delete(service_points::delete_post),
        )
        .route(
            "/:id/services",
            get(service_points::list_offered_services)
                .post(service_points::attach_service)
                .put(service_points::replace_services),
        )
        .route(
            "/:id/services/:service_id",
            axum::routing::delete(service_points::detach_service),
        )
        .route(
            "/:id/photos",
            get(service_points::list_photos).post(service_points::add_photo),
        )
        .route(
            "/:id/photos/:photo_id",
            axum::routing::delete(service_points::delete_photo),
        )
        .route(
            "/:id/photos/:photo_id/main",
            put(service_points::set_main_photo),
        )
        // Schedule of a point
        .route("/:id/schedule", get(schedules::list_slots))
        .route(
            "/:id/schedule/generate",
            post(schedules::generate_schedule),
        )
        .route("/:id/schedule/preview", get(schedules::preview_schedule))
        .route("/:id/schedule/available", get(schedules::available_slots));

    let catalog = Router::new()
        .route(
            "/",
            get(services::list_services).post(services::create_service),
        )
        .route(
            "/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        );

    let slots = Router::new()
        .route("/:id", get(schedules::get_slot))
        .route("/:id/:action", post(schedules::transition_slot));

    let bookings = Router::new()
        .route(
            "/",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/:id",
            get(bookings::get_booking).put(bookings::update_booking),
        )
        .route("/:id/status", put(bookings::change_booking_status))
        .route("/:id/cancel", post(bookings::cancel_booking));

    Router::new()
        .nest("/partners", partners)
        .nest("/service-points", service_points)
        .nest("/services", catalog)
        .nest("/schedules", slots)
        .nest("/bookings", bookings)
        .route("/statuses/normalize", post(statuses::normalize_status))
}

/// The full application: API, health, version and docs, with request ids and
/// HTTP tracing applied. CORS and compression are left to the binary.
pub fn app_router(state: AppState, health: Arc<health::HealthState>) -> Router {
    Router::new()
        .route("/", get(|| async { "bookings-api up" }))
        .route("/version", get(health::version_info))
        .nest("/api/v1", api_v1_routes())
        .nest("/health", health::health_routes(health))
        .merge(openapi::swagger_ui())
        .fallback(not_found)
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("Route not found".to_string())),
    )
}
