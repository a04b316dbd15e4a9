#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Local;
use serde_json::{json, Value};
use thinq_core::DocumentStore;
use thinq_types::Fields;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::router::build_router;
use crate::state::AppState;
use crate::test_helpers::{test_app_state, test_app_state_with_endpoint};

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

fn server_for(state: AppState) -> TestServer {
    TestServer::new(build_router(state)).unwrap()
}

async fn device(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/todos"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_health() {
    let (state, _store) = test_app_state();
    let response = server_for(state).get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (state, _store) = test_app_state();
    let response = server_for(state).get("/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "Not found");
}

#[tokio::test]
async fn test_select_then_reselect() {
    let (state, store) = test_app_state();
    store.set("characters", "x", fields(json!({"name": "X", "is_selected": false}))).await.unwrap();
    store.set("characters", "y", fields(json!({"name": "Y", "is_selected": false}))).await.unwrap();
    let server = server_for(state);

    let response = server.post("/select-character").json(&json!({"character_id": "x"})).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["selected_character_id"], "x");

    let selected = server.get("/selected-character").await.json::<Value>();
    assert_eq!(selected["character"]["character_id"], "x");

    server.post("/select-character").json(&json!({"character_id": "y"})).await.assert_status_ok();
    let selected = server.get("/selected-character").await.json::<Value>();
    assert_eq!(selected["success"], true);
    assert_eq!(selected["character"]["name"], "Y");
    assert_eq!(store.get("characters", "x").await.unwrap().get_bool("is_selected"), Some(false));
}

#[tokio::test]
async fn test_select_requires_existing_id() {
    let (state, store) = test_app_state();
    store.set("characters", "x", fields(json!({"name": "X", "is_selected": true}))).await.unwrap();
    let server = server_for(state);

    let response = server.post("/select-character").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].as_str().unwrap().contains("character_id"));

    server
        .post("/select-character")
        .json(&json!({"character_id": "ghost"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(store.get("characters", "x").await.unwrap().get_bool("is_selected"), Some(true));
}

#[tokio::test]
async fn test_nothing_selected() {
    let (state, _store) = test_app_state();
    let server = server_for(state);

    let response = server.get("/selected-character").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert!(body.get("character").is_none());

    let response = server.get("/esp-image").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "No selected character found");
}

#[tokio::test]
async fn test_upload_then_esp_image() {
    let (state, _store) = test_app_state();
    let server = server_for(state);

    server.post("/upload-image").json(&json!({"name": "Dog"})).await.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/upload-image")
        .json(&json!({"image_data": "data:image/png;base64,AAAA", "name": "Dog"}))
        .await;
    response.assert_status_ok();
    let id = response.json::<Value>()["character_id"].as_str().unwrap().to_string();

    let listed = server.get("/characters").await.json::<Value>();
    assert_eq!(listed[0]["character_id"], id.as_str());
    assert_eq!(listed[0]["generation_type"], "upload");
    assert_eq!(listed[0]["user_id"], "test_user");

    server.post("/select-character").json(&json!({"character_id": id})).await.assert_status_ok();
    let image = server.get("/esp-image").await.json::<Value>();
    assert_eq!(image["image_url"], "data:image/png;base64,AAAA");
}

#[tokio::test]
async fn test_selected_character_without_image() {
    let (state, store) = test_app_state();
    store.set("characters", "x", fields(json!({"name": "X", "is_selected": true}))).await.unwrap();

    let response = server_for(state).get("/esp-image").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "No image URL found");
}

#[tokio::test]
async fn test_titles_and_progress_update() {
    let (state, store) = test_app_state();
    let today = Local::now().format("%Y-%m-%d").to_string();
    store
        .set("todos", "a", fields(json!({"title": "Stretch", "is_completed": false, "due_date_string": today})))
        .await
        .unwrap();
    let server = server_for(state);

    assert_eq!(server.get("/esp-titles").await.json::<Value>(), json!(["Stretch"]));

    let response = server
        .post("/update-todo")
        .json(&json!({"title": "Stretch", "is_completed": true, "stop_time": "10:30"}))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["id"], "a");
    assert_eq!(body["updated"]["stop_time"], "10:30");

    assert_eq!(server.get("/esp-titles").await.json::<Value>(), json!([]));
}

#[tokio::test]
async fn test_update_todo_errors() {
    let (state, _store) = test_app_state();
    let server = server_for(state);

    server.post("/update-todo").json(&json!({"is_completed": true})).await.assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/update-todo")
        .json(&json!({"title": "Missing", "is_completed": true}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_bodies_are_json_400() {
    let (state, _store) = test_app_state();
    let server = server_for(state);

    let response = server.post("/select-character").text("character_id=x").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].as_str().unwrap().starts_with("Invalid JSON body"));

    let response = server
        .post("/update-todo")
        .bytes("{\"title\": ".into())
        .content_type("application/json")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_device_timer_routes() {
    let (state, _store) = test_app_state();
    let server = server_for(state);

    let timer = server.get("/api/timer").await.json::<Value>();
    assert_eq!(timer, json!({"running": false, "elapsedSeconds": 0, "formattedTime": "00:00"}));

    let response = server
        .post("/api/esp32/timer/update")
        .json(&json!({"running": true, "elapsedSeconds": 754}))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["timer"]["formattedTime"], "12:34");

    let body = server.post("/api/timer/stop").await.json::<Value>();
    assert_eq!(body["timer"]["running"], false);
    assert_eq!(body["timer"]["elapsedSeconds"], 754);

    server.post("/api/esp32/timer/start").await.assert_status_ok();
    assert_eq!(server.get("/api/timer").await.json::<Value>()["running"], true);

    server.post("/api/esp32/timer/reset").await.assert_status_ok();
    assert_eq!(server.get("/api/timer").await.json::<Value>()["elapsedSeconds"], 0);
}

#[tokio::test]
async fn test_timed_completion_records_session() {
    let (state, store) = test_app_state();
    store.set("todos", "7", fields(json!({"title": "Read", "is_completed": false}))).await.unwrap();
    store.set("todos", "8", fields(json!({"title": "Walk", "is_completed": true}))).await.unwrap();
    let server = server_for(state);

    let open = server.get("/api/esp32/todos").await.json::<Value>();
    assert_eq!(open.as_array().unwrap().len(), 1);
    assert_eq!(open[0]["title"], "Read");

    let today = Local::now().format("%Y-%m-%d").to_string();
    let response = server
        .post("/api/esp32/todo/complete")
        .json(&json!({
            "todoId": 7,
            "startTime": format!("{today}T09:00:00"),
            "endTime": format!("{today}T09:45:00"),
            "durationSeconds": 2700
        }))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["completedTodo"]["is_completed"], true);
    assert_eq!(body["session"]["formattedDuration"], "45:00");

    let progress = server.get("/api/todos/progress").await.json::<Value>();
    assert_eq!(progress["totalTodos"], 2);
    assert_eq!(progress["completedTodos"], 2);
    assert_eq!(progress["progressPercentage"], 100.0);

    let sessions = server.get("/api/work-sessions/today").await.json::<Value>();
    assert_eq!(sessions.as_array().unwrap().len(), 1);
    assert_eq!(sessions[0]["todoTitle"], "Read");
    assert_eq!(server.get("/api/work-sessions").await.json::<Value>(), sessions);
    assert_eq!(server.get("/api/esp32/todos").await.json::<Value>(), json!([]));
}

#[tokio::test]
async fn test_timed_completion_errors() {
    let (state, store) = test_app_state();
    store.set("todos", "a", fields(json!({"title": "Done", "is_completed": true}))).await.unwrap();
    let server = server_for(state);
    let request = |todo_id: Value, start: &str| {
        json!({"todoId": todo_id, "startTime": start, "endTime": "2026-10-18T10:00:00", "durationSeconds": 60})
    };

    let response = server.post("/api/esp32/todo/complete").json(&request(json!("a"), "2026-10-18T09:59:00")).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].as_str().unwrap().contains("already completed"));

    server
        .post("/api/esp32/todo/complete")
        .json(&request(json!("missing"), "2026-10-18T09:59:00"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post("/api/esp32/todo/complete")
        .json(&request(json!("a"), "yesterday"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/api/esp32/todo/complete")
        .json(&request(Value::Null, "2026-10-18T09:59:00"))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(server.get("/api/work-sessions").await.json::<Value>(), json!([]));
}

#[tokio::test]
async fn test_store_outage_is_500() {
    let (state, store) = test_app_state();
    store.set_available(false);

    let response = server_for(state).get("/esp-titles").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_listening_lifecycle_forwards_changes() {
    let device = device(200, "ok").await;
    let (state, store) = test_app_state_with_endpoint(&format!("{}/api/todos", device.uri()));
    let server = server_for(state);

    let response = server.post("/start-listening").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"status": "listening_started"}));
    assert_eq!(server.post("/start-listening").await.json::<Value>()["status"], "already_listening");

    store.set("todos", "a", fields(json!({"title": "Stretch"}))).await.unwrap();
    let mut delivered = 0;
    for _ in 0..200 {
        delivered = server.get("/status").await.json::<Value>()["relay"]["delivered"].as_u64().unwrap();
        if delivered == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(delivered, 1);

    let sent = device.received_requests().await.unwrap();
    let envelope = sent[0].body_json::<Value>().unwrap();
    assert_eq!(envelope["action"], "create");
    assert_eq!(envelope["id"], "a");

    let status = server.get("/status").await.json::<Value>();
    assert_eq!(status["status"], "running");
    assert_eq!(status["listening"], true);
    assert_eq!(status["relay"]["collection"], "todos");

    let response = server.post("/stop-listening").await;
    assert_eq!(response.json::<Value>(), json!({"status": "listening_stopped"}));
    assert_eq!(server.get("/status").await.json::<Value>()["listening"], false);
}

#[tokio::test]
async fn test_start_listening_store_outage() {
    let (state, store) = test_app_state();
    store.set_available(false);
    let server = server_for(state);

    server.post("/start-listening").await.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let status = server.get("/status").await.json::<Value>();
    assert_eq!(status["listening"], false);
    assert!(status["relay"]["last_error"].is_string());
}

#[tokio::test]
async fn test_device_ping() {
    let device = device(503, "busy").await;
    let (state, _store) = test_app_state_with_endpoint(&format!("{}/api/todos", device.uri()));

    let response = server_for(state).post("/test-esp32").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["esp32_status"], 503);
    assert_eq!(body["esp32_response"], "busy");
}

#[tokio::test]
async fn test_device_ping_unreachable() {
    let (state, _store) = test_app_state();
    let response = server_for(state).post("/test-esp32").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.json::<Value>()["error"].is_string());
}
