mod common;

use axum::http::StatusCode;
use common::{json, TestApp, SYSTEM_PROMPT};
use serde_json::json;

#[tokio::test]
async fn new_session_returns_public_history() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(json("POST", "/chatbot/new", None, json!({ "message": "Where can I eat?" })))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(uuid::Uuid::parse_str(body["id"].as_str().expect("id")).is_ok());

    let history = body["history"].as_array().expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["type"], "user");
    assert_eq!(history[0]["message"], "Where can I eat?");
    assert_eq!(history[1]["type"], "assistant");
    assert_eq!(history[1]["message"], "reply #1");
    assert!(!body.to_string().contains(SYSTEM_PROMPT));

    let prompts = app.model.prompts.lock().await;
    assert_eq!(
        prompts[0],
        format!("{}\n\nUser: Where can I eat?\nAssistant:", SYSTEM_PROMPT)
    );
}

#[tokio::test]
async fn continuing_a_session_keeps_the_transcript() {
    let app = TestApp::new().await;
    let (_, started) = app
        .send(json("POST", "/chatbot/new", None, json!({ "message": "hi" })))
        .await;
    let id = started["id"].as_str().expect("id");

    let (status, body) = app
        .send(json("POST", &format!("/chatbot/{}", id), None, json!({ "message": "and hotels?" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);
    let history = body["history"].as_array().expect("history");
    assert_eq!(history.len(), 4);
    assert_eq!(history[3]["message"], "reply #2");

    let prompts = app.model.prompts.lock().await;
    assert!(prompts[1].ends_with("User: hi\nAssistant: reply #1\nUser: and hotels?\nAssistant:"));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .send(json("POST", "/chatbot/does-not-exist", None, json!({ "message": "hi" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.store.count("chatbot_sessions").await, 0);
}

#[tokio::test]
async fn message_is_required() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(json("POST", "/chatbot/new", None, json!({ "text": "hi" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app
        .send(json("POST", "/chatbot/new", None, json!({ "message": "" })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["field_errors"]["message"].is_string());
    assert!(app.model.prompts.lock().await.is_empty());
}
