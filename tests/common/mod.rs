#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use bookings_api::{
    app_router,
    config::AppConfig,
    db,
    events::{self, EventSender},
    health::HealthState,
    AppState,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

/// Helper harness running the full router over an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A second pooled connection would open a second, empty in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let health = Arc::new(HealthState::new(db_arc.clone()));
        let state = AppState::new(db_arc, cfg, event_sender);
        let router = app_router(state.clone(), health);

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Send a request against the router.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request, asserts the status and returns the decoded body.
    pub async fn expect(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        status: StatusCode,
    ) -> Value {
        let response = self.request(method.clone(), uri, body).await;
        let actual = response.status();
        let payload = response_json(response).await;
        assert_eq!(actual, status, "{method} {uri} returned {payload}");
        payload
    }

    pub async fn create_partner(&self, company_name: &str) -> Value {
        let body = self
            .expect(
                Method::POST,
                "/api/v1/partners",
                Some(json!({
                    "company_name": company_name,
                    "contact_person": "Ivan Petrov",
                    "phone": "+7 900 123-45-67",
                    "email": "office@partner.example",
                })),
                StatusCode::CREATED,
            )
            .await;
        body["data"].clone()
    }

    /// Creates a point open 09:00-12:00 Monday to Friday, closed on weekends.
    pub async fn create_service_point(&self, partner_id: &str, status: Value) -> Value {
        let day = json!({"is_working_day": true, "start": "09:00", "end": "12:00"});
        let body = self
            .expect(
                Method::POST,
                "/api/v1/service-points",
                Some(json!({
                    "partner_id": partner_id,
                    "name": "Tyre centre",
                    "address": "Lenina 1",
                    "city": "Kazan",
                    "status": status,
                    "working_hours": {
                        "monday": day,
                        "tuesday": day,
                        "wednesday": day,
                        "thursday": day,
                        "friday": day,
                        "saturday": {"is_working_day": false},
                        "sunday": {"is_working_day": false},
                    },
                })),
                StatusCode::CREATED,
            )
            .await;
        body["data"].clone()
    }

    pub async fn create_post(&self, point_id: &str, slot_minutes: i32) -> Value {
        let body = self
            .expect(
                Method::POST,
                &format!("/api/v1/service-points/{point_id}/posts"),
                Some(json!({"name": "Bay", "slot_duration_minutes": slot_minutes})),
                StatusCode::CREATED,
            )
            .await;
        body["data"].clone()
    }

    /// Partner, active point and one post with hour-long slots.
    pub async fn seed_open_point(&self) -> (String, String) {
        let partner = self.create_partner("Shin Plus").await;
        let point = self
            .create_service_point(str_field(&partner, "id"), json!("active"))
            .await;
        let point_id = str_field(&point, "id").to_string();
        let post = self.create_post(&point_id, 60).await;
        (point_id, str_field(&post, "id").to_string())
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json response")
}

pub fn str_field<'a>(value: &'a Value, field: &str) -> &'a str {
    value[field]
        .as_str()
        .unwrap_or_else(|| panic!("missing string field {field} in {value}"))
}
