//! Partners, service points and their sub-resources over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use common::{str_field, TestApp};
use rstest::rstest;
use serde_json::{json, Value};

#[tokio::test]
async fn partner_crud_round() {
    let app = TestApp::new().await;

    let partner = app.create_partner("Koleso").await;
    let id = str_field(&partner, "id");
    assert_eq!(partner["is_active"], json!(true));

    let updated = app
        .expect(
            Method::PUT,
            &format!("/api/v1/partners/{id}"),
            Some(json!({"company_name": "Koleso Group"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(updated["data"]["company_name"], "Koleso Group");

    let list = app
        .expect(
            Method::GET,
            "/api/v1/partners?search=Koleso",
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(list["data"]["total"], 1);

    app.expect(
        Method::DELETE,
        &format!("/api/v1/partners/{id}"),
        None,
        StatusCode::NO_CONTENT,
    )
    .await;
    app.expect(
        Method::GET,
        &format!("/api/v1/partners/{id}"),
        None,
        StatusCode::NOT_FOUND,
    )
    .await;
}

#[tokio::test]
async fn invalid_partner_payload_is_rejected() {
    let app = TestApp::new().await;

    app.expect(
        Method::POST,
        "/api/v1/partners",
        Some(json!({
            "company_name": "",
            "contact_person": "Ivan",
            "phone": "+7 900 000-00-00",
            "email": "not-an-email",
        })),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[rstest]
#[case(json!("работает"), "active")]
#[case(json!("Временно закрыта"), "suspended")]
#[case(json!(3), "closed")]
#[case(json!(false), "suspended")]
#[case(json!("mystery"), "active")]
#[case(json!(3.0), "closed")]
#[case(json!(1.5), "active")]
#[case(json!(null), "active")]
#[tokio::test]
async fn legacy_status_is_normalized_on_create(#[case] raw: Value, #[case] expected: &str) {
    let app = TestApp::new().await;
    let partner = app.create_partner("Legacy").await;

    let point = app
        .create_service_point(str_field(&partner, "id"), raw)
        .await;
    assert_eq!(point["status"], expected);
}

#[tokio::test]
async fn service_point_requires_existing_partner() {
    let app = TestApp::new().await;

    app.expect(
        Method::POST,
        "/api/v1/service-points",
        Some(json!({
            "partner_id": uuid::Uuid::new_v4(),
            "name": "Orphan",
            "address": "Nowhere 1",
            "city": "Kazan",
        })),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn partner_with_points_cannot_be_deleted() {
    let app = TestApp::new().await;
    let partner = app.create_partner("Busy").await;
    let partner_id = str_field(&partner, "id");
    app.create_service_point(partner_id, json!("active")).await;

    app.expect(
        Method::DELETE,
        &format!("/api/v1/partners/{partner_id}"),
        None,
        StatusCode::CONFLICT,
    )
    .await;

    let points = app
        .expect(
            Method::GET,
            &format!("/api/v1/partners/{partner_id}/service-points"),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(points["data"]["total"], 1);
}

#[tokio::test]
async fn status_endpoint_accepts_legacy_values() {
    let app = TestApp::new().await;
    let partner = app.create_partner("Status").await;
    let point = app
        .create_service_point(str_field(&partner, "id"), json!("active"))
        .await;
    let point_id = str_field(&point, "id");

    let changed = app
        .expect(
            Method::PUT,
            &format!("/api/v1/service-points/{point_id}/status"),
            Some(json!({"status": "приостановлена"})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(changed["data"]["status"], "suspended");

    let filtered = app
        .expect(
            Method::GET,
            "/api/v1/service-points?status=suspended",
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(filtered["data"]["total"], 1);
}

#[tokio::test]
async fn soft_deleted_point_can_be_restored() {
    let app = TestApp::new().await;
    let partner = app.create_partner("Restore").await;
    let point = app
        .create_service_point(str_field(&partner, "id"), json!("active"))
        .await;
    let uri = format!("/api/v1/service-points/{}", str_field(&point, "id"));

    app.expect(Method::DELETE, &uri, None, StatusCode::NO_CONTENT)
        .await;
    app.expect(Method::GET, &uri, None, StatusCode::NOT_FOUND)
        .await;

    app.expect(
        Method::POST,
        &format!("{uri}/restore"),
        None,
        StatusCode::OK,
    )
    .await;
    app.expect(Method::GET, &uri, None, StatusCode::OK).await;

    // a live point cannot be restored twice
    app.expect(
        Method::POST,
        &format!("{uri}/restore"),
        None,
        StatusCode::UNPROCESSABLE_ENTITY,
    )
    .await;
}

#[tokio::test]
async fn invalid_working_hours_are_rejected() {
    let app = TestApp::new().await;
    let partner = app.create_partner("Hours").await;
    let point = app
        .create_service_point(str_field(&partner, "id"), json!("active"))
        .await;

    app.expect(
        Method::PUT,
        &format!(
            "/api/v1/service-points/{}/working-hours",
            str_field(&point, "id")
        ),
        Some(json!({"monday": {"is_working_day": true, "start": "18:00", "end": "09:00"}})),
        StatusCode::BAD_REQUEST,
    )
    .await;
}

#[tokio::test]
async fn posts_are_numbered_sequentially() {
    let app = TestApp::new().await;
    let (point_id, _) = app.seed_open_point().await;

    let second = app.create_post(&point_id, 30).await;
    assert_eq!(second["post_number"], 2);

    app.expect(
        Method::POST,
        &format!("/api/v1/service-points/{point_id}/posts"),
        Some(json!({"name": "Duplicate", "post_number": 2})),
        StatusCode::CONFLICT,
    )
    .await;

    let posts = app
        .expect(
            Method::GET,
            &format!("/api/v1/service-points/{point_id}/posts"),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(posts["data"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn offered_services_and_photos_show_in_detail() {
    let app = TestApp::new().await;
    let (point_id, _) = app.seed_open_point().await;

    let service = app
        .expect(
            Method::POST,
            "/api/v1/services",
            Some(json!({"name": "Tyre fitting", "default_duration_minutes": 60})),
            StatusCode::CREATED,
        )
        .await;
    let service_id = str_field(&service["data"], "id").to_string();

    app.expect(
        Method::POST,
        &format!("/api/v1/service-points/{point_id}/services"),
        Some(json!({"service_id": service_id, "comment": "R13-R18"})),
        StatusCode::OK,
    )
    .await;

    for url in ["https://cdn.example/a.jpg", "https://cdn.example/b.jpg"] {
        app.expect(
            Method::POST,
            &format!("/api/v1/service-points/{point_id}/photos"),
            Some(json!({"url": url})),
            StatusCode::CREATED,
        )
        .await;
    }

    let detail = app
        .expect(
            Method::GET,
            &format!("/api/v1/service-points/{point_id}"),
            None,
            StatusCode::OK,
        )
        .await;
    let data = &detail["data"];
    assert_eq!(data["services"][0]["service"]["name"], "Tyre fitting");
    assert_eq!(data["services"][0]["comment"], "R13-R18");
    assert_eq!(data["photos"][0]["url"], "https://cdn.example/a.jpg");
    assert_eq!(data["photos"][0]["is_main"], true);
    assert_eq!(data["photos"][1]["is_main"], false);

    // attached services block catalog deletion
    app.expect(
        Method::DELETE,
        &format!("/api/v1/services/{service_id}"),
        None,
        StatusCode::CONFLICT,
    )
    .await;
}

#[tokio::test]
async fn working_hours_are_replaced_whole() {
    let app = TestApp::new().await;
    let (point_id, _) = app.seed_open_point().await;
    let uri = format!("/api/v1/service-points/{point_id}/working-hours");

    let current = app.expect(Method::GET, &uri, None, StatusCode::OK).await;
    assert_eq!(current["data"]["monday"]["start"], "09:00");
    assert_eq!(current["data"]["sunday"]["is_working_day"], false);

    let replaced = app
        .expect(
            Method::PUT,
            &uri,
            Some(json!({"monday": {"is_working_day": true, "start": "10:00", "end": "14:00:00"}})),
            StatusCode::OK,
        )
        .await;
    assert_eq!(replaced["data"]["monday"]["end"], "14:00");

    let stored = app.expect(Method::GET, &uri, None, StatusCode::OK).await;
    assert_eq!(stored["data"]["monday"]["start"], "10:00");
    assert!(stored["data"]["tuesday"].is_null());

    // minute precision only; the extractor refuses the body
    let with_seconds = app
        .request(
            Method::PUT,
            &uri,
            Some(json!({"monday": {"start": "10:00:30", "end": "14:00"}})),
        )
        .await;
    assert_eq!(with_seconds.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let unchanged = app.expect(Method::GET, &uri, None, StatusCode::OK).await;
    assert_eq!(unchanged["data"]["monday"]["start"], "10:00");
}

#[tokio::test]
async fn main_photo_moves_on_delete_and_on_request() {
    let app = TestApp::new().await;
    let (point_id, _) = app.seed_open_point().await;
    let photos_uri = format!("/api/v1/service-points/{point_id}/photos");

    let mut ids = Vec::new();
    for (url, sort_order) in [
        ("https://cdn.example/a.jpg", 0),
        ("https://cdn.example/b.jpg", 1),
        ("https://cdn.example/c.jpg", 2),
    ] {
        let photo = app
            .expect(
                Method::POST,
                &photos_uri,
                Some(json!({"url": url, "sort_order": sort_order})),
                StatusCode::CREATED,
            )
            .await;
        ids.push(str_field(&photo["data"], "id").to_string());
    }

    let promoted = app
        .expect(
            Method::PUT,
            &format!("{photos_uri}/{}/main", ids[2]),
            None,
            StatusCode::OK,
        )
        .await;
    assert_eq!(promoted["data"]["is_main"], true);

    let listed = app.expect(Method::GET, &photos_uri, None, StatusCode::OK).await;
    let mains: Vec<&str> = listed["data"]
        .as_array()
        .map(|photos| {
            photos
                .iter()
                .filter(|p| p["is_main"] == true)
                .map(|p| str_field(p, "id"))
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(mains, vec![ids[2].as_str()]);

    // deleting the main photo hands the flag to the lowest sort order
    app.expect(
        Method::DELETE,
        &format!("{photos_uri}/{}", ids[2]),
        None,
        StatusCode::NO_CONTENT,
    )
    .await;
    let listed = app.expect(Method::GET, &photos_uri, None, StatusCode::OK).await;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(listed["data"][0]["id"], ids[0].as_str());
    assert_eq!(listed["data"][0]["is_main"], true);
    assert_eq!(listed["data"][1]["is_main"], false);
}
