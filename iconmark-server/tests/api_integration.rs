//! Integration tests for the save/load HTTP API over a real socket.

mod common;

use common::server::TestServer;
use serde_json::{json, Value};

fn icon(x: f64, y: f64, size: f64, src: &str) -> Value {
    json!({ "x": x, "y": y, "size": size, "imgSrc": src })
}

async fn save(client: &reqwest::Client, server: &TestServer, icons: Vec<Value>) -> reqwest::Response {
    client
        .post(format!("{}/save-icons", server.base_url()))
        .json(&json!({ "placedIcons": icons }))
        .send()
        .await
        .expect("send")
}

#[tokio::test]
async fn test_save_then_load_round_trip() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let icons = vec![
        icon(10.0, 20.0, 50.0, "pin.png"),
        icon(-5.5, 300.25, 35.0, "data:image/png;base64,iVBORw0KGgo="),
        icon(10.0, 20.0, 50.0, "flag.png"),
    ];
    let response = save(&client, &server, icons.clone()).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("json");
    let session_id = body["SessionId"].as_str().expect("SessionId").to_string();
    assert!(uuid::Uuid::parse_str(&session_id).is_ok());

    let loaded: Vec<Value> = client
        .get(format!("{}/get-icons/{session_id}", server.base_url()))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(loaded, icons);

    server.shutdown().await;
}

#[tokio::test]
async fn test_double_precision_and_large_sizes_survive_round_trip() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let icons = vec![
        icon(0.1, 123.456_789, 50.0, "pin.png"),
        icon(1.0, 2.0, 20_000.0, "big.png"),
    ];
    let response = save(&client, &server, icons.clone()).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("json");
    let session_id = body["SessionId"].as_str().expect("SessionId").to_string();

    let loaded: Vec<Value> = client
        .get(format!("{}/get-icons/{session_id}", server.base_url()))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(loaded, icons);
    assert_eq!(loaded[0]["y"].as_f64(), Some(123.456_789));

    server.shutdown().await;
}

#[tokio::test]
async fn test_empty_save_is_a_session() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let body: Value = save(&client, &server, vec![])
        .await
        .json()
        .await
        .expect("json");
    let session_id = body["SessionId"].as_str().expect("SessionId");

    let loaded: Vec<Value> = client
        .get(format!("{}/get-icons/{session_id}", server.base_url()))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert!(loaded.is_empty());
    assert_eq!(server.state().sessions.len(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_rejected_save_stores_nothing() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let response = save(&client, &server, vec![icon(0.0, 0.0, 50.0, "")]).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json");
    assert!(body["error"].as_str().expect("error").contains("imgSrc"));
    assert!(server.state().sessions.is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let server = TestServer::start().await;
    let response = reqwest::get(format!(
        "{}/get-icons/00000000-0000-0000-0000-000000000000",
        server.base_url()
    ))
    .await
    .expect("send");
    assert_eq!(response.status(), 404);
    server.shutdown().await;
}

#[tokio::test]
async fn test_health_endpoints() {
    let server = TestServer::start().await;

    let live = reqwest::get(format!("{}/health/live", server.base_url()))
        .await
        .expect("send");
    assert_eq!(live.status(), 200);

    let ready: Value = reqwest::get(format!("{}/health/ready", server.base_url()))
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(ready["status"], "healthy");
    assert_eq!(ready["checks"]["sessions"], 0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_saves_get_distinct_sessions() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let url = format!("{}/save-icons", server.base_url());

    let mut tasks = Vec::new();
    for i in 0..8u8 {
        let client = client.clone();
        let url = url.clone();
        tasks.push(tokio::spawn(async move {
            let body: Value = client
                .post(url)
                .json(&json!({ "placedIcons": [icon(f64::from(i), 0.0, 20.0, "pin.png")] }))
                .send()
                .await
                .expect("send")
                .json()
                .await
                .expect("json");
            body["SessionId"].as_str().expect("id").to_string()
        }));
    }

    let mut ids = std::collections::HashSet::new();
    for task in tasks {
        ids.insert(task.await.expect("join"));
    }
    assert_eq!(ids.len(), 8);
    assert_eq!(server.state().sessions.len(), 8);

    server.shutdown().await;
}
