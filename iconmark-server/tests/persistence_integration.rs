//! Integration tests for on-disk session persistence.
//!
//! Recreating a store over the same directory simulates a server restart.

mod common;

use common::server::TestServer;
use iconmark_core::PersistedIconRecord;
use iconmark_server::SessionStore;

fn record(x: f64, src: &str) -> PersistedIconRecord {
    PersistedIconRecord {
        x,
        y: 40.0,
        size: 30.0,
        img_src: src.to_string(),
    }
}

#[test]
fn test_disk_round_trip_keeps_double_precision() {
    let dir = tempfile::tempdir().expect("tempdir");
    let precise = PersistedIconRecord {
        x: 0.1,
        y: 123.456_789,
        size: 20_000.0,
        img_src: "pin.png".to_string(),
    };

    let id = SessionStore::with_data_dir(dir.path())
        .expect("store1")
        .save(vec![precise.clone()])
        .expect("save");

    let store = SessionStore::with_data_dir(dir.path()).expect("store2");
    assert_eq!(store.get(&id).expect("session"), vec![precise]);
}

#[test]
fn test_sessions_survive_store_recreation() {
    let dir = tempfile::tempdir().expect("tempdir");

    let (first, second) = {
        let store = SessionStore::with_data_dir(dir.path()).expect("store1");
        let first = store
            .save(vec![record(1.0, "a.png"), record(2.0, "b.png")])
            .expect("save1");
        let second = store.save(vec![record(3.0, "c.png")]).expect("save2");
        (first, second)
    };
    // Store dropped; only disk files remain

    let store = SessionStore::with_data_dir(dir.path()).expect("store2");
    assert_eq!(store.len(), 2);
    assert_eq!(
        store.get(&first).expect("first"),
        vec![record(1.0, "a.png"), record(2.0, "b.png")]
    );
    assert_eq!(store.get(&second).expect("second").len(), 1);

    let mut ids = store.session_ids();
    ids.sort();
    let mut expected = vec![first, second];
    expected.sort();
    assert_eq!(ids, expected);
}

#[test]
fn test_corrupt_files_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("broken.json"), b"{ not json").expect("write");
    std::fs::write(dir.path().join("notes.txt"), b"ignored").expect("write");

    let store = SessionStore::with_data_dir(dir.path()).expect("store");
    assert!(store.is_empty());

    let id = store.save(vec![record(1.0, "a.png")]).expect("save");
    let reloaded = SessionStore::with_data_dir(dir.path()).expect("store2");
    assert_eq!(reloaded.session_ids(), vec![id]);
}

#[test]
fn test_load_missing_session_file_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SessionStore::with_data_dir(dir.path()).expect("store");
    assert!(matches!(
        store.load_session_from_disk("missing"),
        Err(iconmark_server::StoreError::Io(_))
    ));
}

#[tokio::test]
async fn test_saved_over_http_readable_after_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let client = reqwest::Client::new();

    let server = TestServer::with_store(SessionStore::with_data_dir(dir.path()).expect("store")).await;
    let body: serde_json::Value = client
        .post(format!("{}/save-icons", server.base_url()))
        .json(&serde_json::json!({ "placedIcons": [record(5.0, "pin.png")] }))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    let session_id = body["SessionId"].as_str().expect("id").to_string();
    server.shutdown().await;

    let server = TestServer::with_store(SessionStore::with_data_dir(dir.path()).expect("store")).await;
    let loaded: Vec<PersistedIconRecord> = client
        .get(format!("{}/get-icons/{session_id}", server.base_url()))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(loaded, vec![record(5.0, "pin.png")]);
    server.shutdown().await;
}
