//! End-to-end booking flow: slot claim, status changes and their effect on the slot.

mod common;

use axum::http::{Method, StatusCode};
use common::{str_field, TestApp};
use serde_json::{json, Value};

const DAY: &str = "2030-01-08";

/// Seeds an open point with one generated day and returns `(point_id, first_slot_id)`.
async fn seed_slot(app: &TestApp) -> (String, String) {
    let (point_id, _) = app.seed_open_point().await;
    app.expect(
        Method::POST,
        &format!("/api/v1/service-points/{point_id}/schedule/generate"),
        Some(json!({"start_date": DAY, "end_date": DAY})),
        StatusCode::CREATED,
    )
    .await;

    let available = app
        .expect(
            Method::GET,
            &format!("/api/v1/service-points/{point_id}/schedule/available?date={DAY}"),
            None,
            StatusCode::OK,
        )
        .await;
    let slot_id = str_field(&available["data"][0], "id").to_string();
    (point_id, slot_id)
}

fn booking_body(slot_id: &str) -> Value {
    json!({
        "schedule_id": slot_id,
        "client_name": "Anna Smirnova",
        "client_phone": "+7 917 000-11-22",
        "client_email": "anna@example.com",
        "car_brand": "Lada",
        "car_model": "Vesta",
        "license_plate": "a123bc116",
    })
}

async fn slot_status(app: &TestApp, slot_id: &str) -> Value {
    let slot = app
        .expect(
            Method::GET,
            &format!("/api/v1/schedules/{slot_id}"),
            None,
            StatusCode::OK,
        )
        .await;
    slot["data"]["status"].clone()
}

async fn create_booking(app: &TestApp, slot_id: &str) -> Value {
    let created = app
        .expect(
            Method::POST,
            "/api/v1/bookings",
            Some(booking_body(slot_id)),
            StatusCode::CREATED,
        )
        .await;
    created["data"].clone()
}

#[tokio::test]
async fn booking_claims_the_slot_once() {
    let app = TestApp::new().await;
    let (point_id, slot_id) = seed_slot(&app).await;

    let booking = create_booking(&app, &slot_id).await;
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["service_point_id"], point_id.as_str());
    assert_eq!(booking["booking_date"], DAY);
    assert_eq!(booking["license_plate"], "A123BC116");
    assert_eq!(slot_status(&app, &slot_id).await, "booked");

    // second client loses the race for the same slot
    app.expect(
        Method::POST,
        "/api/v1/bookings",
        Some(booking_body(&slot_id)),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
    assert_eq!(slot_status(&app, &slot_id).await, "booked");

    let listed = app
        .expect(
            Method::GET,
            &format!("/api/v1/bookings?service_point_id={point_id}"),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(listed["data"]["total"], 1);
}

#[tokio::test]
async fn cancelling_frees_the_slot() {
    let app = TestApp::new().await;
    let (_, slot_id) = seed_slot(&app).await;
    let booking = create_booking(&app, &slot_id).await;
    let booking_id = str_field(&booking, "id");

    let cancelled = app
        .expect(
            Method::POST,
            &format!("/api/v1/bookings/{booking_id}/cancel"),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(cancelled["data"]["status"], "cancelled");
    assert_eq!(slot_status(&app, &slot_id).await, "available");

    // cancelled is terminal
    app.expect(
        Method::PUT,
        &format!("/api/v1/bookings/{booking_id}/status"),
        Some(json!({"status": "confirmed"})),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;

    // the freed slot can be booked again
    create_booking(&app, &slot_id).await;
}

#[tokio::test]
async fn confirm_then_complete_closes_the_slot() {
    let app = TestApp::new().await;
    let (_, slot_id) = seed_slot(&app).await;
    let booking = create_booking(&app, &slot_id).await;
    let status_uri = format!("/api/v1/bookings/{}/status", str_field(&booking, "id"));

    let confirmed = app
        .expect(
            Method::PUT,
            &status_uri,
            Some(json!({"status": "confirmed"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(confirmed["data"]["status"], "confirmed");
    assert_eq!(slot_status(&app, &slot_id).await, "booked");

    app.expect(
        Method::PUT,
        &status_uri,
        Some(json!({"status": "completed"})),
        StatusCode::OK,
    )
    .await;
    assert_eq!(slot_status(&app, &slot_id).await, "completed");

    app.expect(
        Method::PUT,
        &status_uri,
        Some(json!({"status": "cancelled"})),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
}

#[tokio::test]
async fn booked_slot_refuses_manual_actions() {
    let app = TestApp::new().await;
    let (_, slot_id) = seed_slot(&app).await;
    create_booking(&app, &slot_id).await;

    app.expect(
        Method::POST,
        &format!("/api/v1/schedules/{slot_id}/cancel"),
        None,
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
    assert_eq!(slot_status(&app, &slot_id).await, "booked");
}

#[tokio::test]
async fn point_with_active_bookings_cannot_be_deleted() {
    let app = TestApp::new().await;
    let (point_id, slot_id) = seed_slot(&app).await;
    create_booking(&app, &slot_id).await;

    app.expect(
        Method::DELETE,
        &format!("/api/v1/service-points/{point_id}"),
        None,
        StatusCode::CONFLICT,
    )
    .await;
}

#[tokio::test]
async fn suspended_point_takes_no_bookings() {
    let app = TestApp::new().await;
    let (point_id, slot_id) = seed_slot(&app).await;

    app.expect(
        Method::PUT,
        &format!("/api/v1/service-points/{point_id}/status"),
        Some(json!({"status": "suspended"})),
        StatusCode::OK,
    )
    .await;

    app.expect(
        Method::POST,
        "/api/v1/bookings",
        Some(booking_body(&slot_id)),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
    assert_eq!(slot_status(&app, &slot_id).await, "available");
}

#[tokio::test]
async fn unknown_slot_is_not_found() {
    let app = TestApp::new().await;

    app.expect(
        Method::POST,
        "/api/v1/bookings",
        Some(booking_body(&uuid::Uuid::new_v4().to_string())),
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn status_normalize_endpoint_reports_recognition() {
    let app = TestApp::new().await;

    let known = app
        .expect(
            Method::POST,
            "/api/v1/statuses/normalize",
            Some(json!({"status": "не работает"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(known["data"]["status"], "closed");
    assert_eq!(known["data"]["recognized"], true);

    let unknown = app
        .expect(
            Method::POST,
            "/api/v1/statuses/normalize",
            Some(json!({"status": 42})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(unknown["data"]["status"], "active");
    assert_eq!(unknown["data"]["recognized"], false);

    let float_code = app
        .expect(
            Method::POST,
            "/api/v1/statuses/normalize",
            Some(json!({"status": 1.0})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(float_code["data"]["status"], "active");
    assert_eq!(float_code["data"]["recognized"], true);

    let missing = app
        .expect(
            Method::POST,
            "/api/v1/statuses/normalize",
            Some(json!({"status": null})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(missing["data"]["status"], "active");
    assert_eq!(missing["data"]["recognized"], false);
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let app = TestApp::new().await;
    let body = app
        .expect(Method::GET, "/api/v1/nope", None, StatusCode::NOT_FOUND)
        .await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn service_not_offered_by_the_point_is_rejected() {
    let app = TestApp::new().await;
    let (_, slot_id) = seed_slot(&app).await;

    // in the catalog but never attached to the point
    let service = app
        .expect(
            Method::POST,
            "/api/v1/services",
            Some(json!({"name": "Wheel alignment", "default_duration_minutes": 60})),
            StatusCode::CREATED,
        )
        .await;
    let mut body = booking_body(&slot_id);
    body["service_id"] = service["data"]["id"].clone();

    app.expect(
        Method::POST,
        "/api/v1/bookings",
        Some(body),
        StatusCode::BAD_REQUEST,
    )
    .await;
    assert_eq!(slot_status(&app, &slot_id).await, "available");
}

#[tokio::test]
async fn details_are_editable_until_the_booking_ends() {
    let app = TestApp::new().await;
    let (point_id, _) = seed_slot(&app).await;
    let available = app
        .expect(
            Method::GET,
            &format!("/api/v1/service-points/{point_id}/schedule/available?date={DAY}"),
            None,
            StatusCode::OK,
        )
        .await;
    let first_slot = str_field(&available["data"][0], "id").to_string();
    let second_slot = str_field(&available["data"][1], "id").to_string();

    let booking = create_booking(&app, &first_slot).await;
    let uri = format!("/api/v1/bookings/{}", str_field(&booking, "id"));

    let edited = app
        .expect(
            Method::PUT,
            &uri,
            Some(json!({"car_model": "Granta", "license_plate": " o777oo116 ", "comment": "Winter tyres"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(edited["data"]["car_model"], "Granta");
    assert_eq!(edited["data"]["license_plate"], "O777OO116");
    assert_eq!(edited["data"]["client_name"], "Anna Smirnova");
    assert_eq!(edited["data"]["status"], "pending");

    app.expect(
        Method::POST,
        &format!("{uri}/cancel"),
        None,
        StatusCode::OK,
    )
    .await;
    app.expect(
        Method::PUT,
        &uri,
        Some(json!({"comment": "too late"})),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;

    let completed = create_booking(&app, &second_slot).await;
    let completed_uri = format!("/api/v1/bookings/{}", str_field(&completed, "id"));
    for status in ["confirmed", "completed"] {
        app.expect(
            Method::PUT,
            &format!("{completed_uri}/status"),
            Some(json!({"status": status})),
            StatusCode::OK,
        )
        .await;
    }
    app.expect(
        Method::PUT,
        &completed_uri,
        Some(json!({"client_name": "Someone Else"})),
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;

    let unchanged = app
        .expect(Method::GET, &completed_uri, None, StatusCode::OK)
        .await;
    assert_eq!(unchanged["data"]["client_name"], "Anna Smirnova");
}

#[tokio::test]
async fn booked_post_cannot_be_deleted() {
    let app = TestApp::new().await;
    let (point_id, slot_id) = seed_slot(&app).await;
    let slot = app
        .expect(
            Method::GET,
            &format!("/api/v1/schedules/{slot_id}"),
            None,
            StatusCode::OK,
        )
        .await;
    let booked_post = str_field(&slot["data"], "service_post_id").to_string();
    create_booking(&app, &slot_id).await;

    app.expect(
        Method::DELETE,
        &format!("/api/v1/service-points/{point_id}/posts/{booked_post}"),
        None,
        StatusCode::CONFLICT,
    )
    .await;
    assert_eq!(slot_status(&app, &slot_id).await, "booked");

    // a post without bookings takes its slots with it
    let spare = app.create_post(&point_id, 60).await;
    let spare_id = str_field(&spare, "id").to_string();
    let report = app
        .expect(
            Method::POST,
            &format!("/api/v1/service-points/{point_id}/schedule/generate"),
            Some(json!({"start_date": DAY, "end_date": DAY})),
            StatusCode::CREATED,
        )
        .await;
    assert_eq!(report["data"]["created"], 3);

    let spare_slots_uri =
        format!("/api/v1/service-points/{point_id}/schedule?post_id={spare_id}");
    let before = app
        .expect(Method::GET, &spare_slots_uri, None, StatusCode::OK)
        .await;
    assert_eq!(before["data"]["total"], 3);

    app.expect(
        Method::DELETE,
        &format!("/api/v1/service-points/{point_id}/posts/{spare_id}"),
        None,
        StatusCode::NO_CONTENT,
    )
    .await;
    let after = app
        .expect(Method::GET, &spare_slots_uri, None, StatusCode::OK)
        .await;
    assert_eq!(after["data"]["total"], 0);

    let remaining = app
        .expect(
            Method::GET,
            &format!("/api/v1/service-points/{point_id}/schedule"),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(remaining["data"]["total"], 3);
}

#[tokio::test]
async fn slot_of_a_deleted_point_cannot_be_booked() {
    let app = TestApp::new().await;
    let (point_id, slot_id) = seed_slot(&app).await;

    app.expect(
        Method::DELETE,
        &format!("/api/v1/service-points/{point_id}"),
        None,
        StatusCode::NO_CONTENT,
    )
    .await;

    app.expect(
        Method::POST,
        "/api/v1/bookings",
        Some(booking_body(&slot_id)),
        StatusCode::NOT_FOUND,
    )
    .await;
}
