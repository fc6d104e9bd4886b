mod common;

use axum::http::StatusCode;
use common::{delete, get, json, TestApp, ALICE, BOB};
use serde_json::json;

fn booking(hospitality: &str) -> serde_json::Value {
    json!({
        "hospitalityID": hospitality,
        "startDate": "2025-01-10T12:00:00Z",
        "endDate": "2025-01-12T10:00:00Z",
        "ticketCount": 2
    })
}

#[tokio::test]
async fn bookings_require_a_bearer_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send(get("/bookings/", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.send(get("/bookings/", Some("forged"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_then_read_back() {
    let app = TestApp::new().await;

    let (status, created) = app
        .send(json("POST", "/bookings/", Some(ALICE), booking("h1")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user"], "alice");
    assert_eq!(created["hospitalityID"], "h1");
    assert_eq!(created["ticketCount"], 2);
    assert!(created["createdOn"].is_string());

    let id = created["id"].as_str().expect("id");
    let (status, fetched) = app.send(get(&format!("/bookings/{}", id), Some(ALICE))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], id);
}

#[tokio::test]
async fn client_supplied_user_is_ignored() {
    let app = TestApp::new().await;
    let mut body = booking("h1");
    body["user"] = json!("mallory");

    let (status, created) = app.send(json("POST", "/bookings", Some(ALICE), body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user"], "alice");
}

#[tokio::test]
async fn invalid_booking_is_unprocessable() {
    let app = TestApp::new().await;
    let body = json!({
        "hospitalityID": "h1",
        "startDate": "2025-01-12T10:00:00Z",
        "endDate": "2025-01-10T10:00:00Z",
        "ticketCount": 0
    });

    let (status, body) = app.send(json("POST", "/bookings/", Some(ALICE), body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["endDate"].is_string());
    assert!(body["field_errors"]["ticketCount"].is_string());
    assert_eq!(app.store.count("bookings").await, 0);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = TestApp::new().await;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/bookings/")
        .header("authorization", format!("Bearer {}", ALICE))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .expect("request");

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");
}

#[tokio::test]
async fn list_only_returns_callers_bookings() {
    let app = TestApp::new().await;
    app.send(json("POST", "/bookings/", Some(ALICE), booking("h1"))).await;
    app.send(json("POST", "/bookings/", Some(ALICE), booking("h2"))).await;
    app.send(json("POST", "/bookings/", Some(BOB), booking("h3"))).await;

    let (status, body) = app.send(get("/bookings/", Some(ALICE))).await;
    assert_eq!(status, StatusCode::OK);
    let bookings = body.as_array().expect("array");
    assert_eq!(bookings.len(), 2);
    assert!(bookings.iter().all(|b| b["user"] == "alice"));

    let (_, body) = app.send(get("/bookings/", Some(BOB))).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn other_users_get_forbidden() {
    let app = TestApp::new().await;
    let (_, created) = app
        .send(json("POST", "/bookings/", Some(ALICE), booking("h1")))
        .await;
    let uri = format!("/bookings/{}", created["id"].as_str().expect("id"));

    let (status, _) = app.send(get(&uri, Some(BOB))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(delete(&uri, Some(BOB))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.count("bookings").await, 1);
}

#[tokio::test]
async fn delete_removes_booking() {
    let app = TestApp::new().await;
    let (_, created) = app
        .send(json("POST", "/bookings/", Some(ALICE), booking("h1")))
        .await;
    let uri = format!("/bookings/{}", created["id"].as_str().expect("id"));

    let (status, body) = app.send(delete(&uri, Some(ALICE))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = app.send(get(&uri, Some(ALICE))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(delete(&uri, Some(ALICE))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
