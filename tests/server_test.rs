// Integration test for the LabServer HTTP surface.

use std::sync::Arc;

use serde_json::{json, Value};

use lab_engine::config::EngineConfig;
use lab_engine::server::handler::LabServer;
use lab_engine::server::state::AppState;
use lab_engine::source::memory_store::MemoryReadingStore;

async fn start_server() -> LabServer {
    let config = EngineConfig::default();
    let state = AppState::with_store(&config, Arc::new(MemoryReadingStore::sample())).unwrap();
    LabServer::start("127.0.0.1:0", state).await.unwrap()
}

#[tokio::test]
async fn test_ping() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(server.url("/api/ping"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"ok": true, "status": "ok"}));

    server.shutdown();
}

#[tokio::test]
async fn test_cache_endpoints() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    // Prime 1..=6: the sixth put evicts reading 1.
    for id in 1..=6 {
        let resp = client
            .post(server.url("/api/cache/put"))
            .json(&json!({ "id": id }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["item"]["id"], id);
    }

    let resp = client
        .get(server.url("/api/cache/get/2"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["hit"], true);
    assert_eq!(body["item"]["glucose"], 142.0);
    assert_eq!(body["stats"], json!({"capacity": 5, "size": 5, "hits": 1, "misses": 0}));

    let body: Value = client
        .get(server.url("/api/cache/get/1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["hit"], false);
    assert_eq!(body["stats"]["misses"], 1);

    let body: Value = client
        .get(server.url("/api/cache"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["capacity"], 5);
    assert_eq!(body["size"], 5);
    let ids: Vec<u64> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| pair[0].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2, 6, 5, 4]);
    assert_eq!(body["items"][0][1]["context"], "fasting");

    server.shutdown();
}

#[tokio::test]
async fn test_cache_errors() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(server.url("/api/cache/get/99"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["kind"], "not_found");
    assert!(body["error"].is_string());

    let resp = client
        .get(server.url("/api/cache/get/0"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .get(server.url("/api/cache/get/abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "invalid_argument");

    let resp = client
        .post(server.url("/api/cache/put"))
        .json(&json!({ "id": -3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(server.url("/api/cache/put"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);

    // Failed requests touch no counters.
    let body: Value = client
        .get(server.url("/api/cache"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!((body["hits"].as_u64(), body["misses"].as_u64()), (Some(0), Some(0)));
    assert_eq!(body["size"], 0);

    server.shutdown();
}

#[tokio::test]
async fn test_scheduler_endpoints() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(server.url("/api/scheduler"))
        .json(&json!({"name": "A", "priority": 2, "ticks": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["task"]["name"], "A");
    assert_eq!(body["task"]["id"], 1);

    let resp = client
        .post(server.url("/api/scheduler"))
        .json(&json!({"name": "B", "priority": 1, "ticks": 2}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    // Defaults: priority 5, ticks 1.
    let body: Value = client
        .post(server.url("/api/scheduler"))
        .json(&json!({"name": "C"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["task"]["priority"], 5);
    assert_eq!(body["task"]["ticks"], 1);

    let body: Value = client
        .get(server.url("/api/scheduler"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let queue: Vec<&str> = body["queue"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(queue, vec!["B", "A", "C"]);
    assert_eq!(body["history"], json!([]));

    let resp = client
        .post(server.url("/api/scheduler/run?ticks=3"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let executed: Vec<(String, u64)> = body["executed"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["name"].as_str().unwrap().to_string(), e["ticks"].as_u64().unwrap()))
        .collect();
    assert_eq!(
        executed,
        vec![("B".to_string(), 1), ("B".to_string(), 0), ("A".to_string(), 0)]
    );
    assert_eq!(body["queue"].as_array().unwrap().len(), 1);
    assert_eq!(body["history"][0]["name"], "B");
    assert!(body["history"][0]["executed_at"].is_string());

    // Missing query defaults to one tick.
    let body: Value = client
        .post(server.url("/api/scheduler/run"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["executed"][0]["name"], "C");
    assert_eq!(body["queue"], json!([]));

    server.shutdown_and_wait().await;
}

#[tokio::test]
async fn test_scheduler_validation() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    for bad in [
        json!({"name": "x", "priority": 0, "ticks": 1}),
        json!({"name": "x", "priority": 11, "ticks": 1}),
        json!({"name": "x", "priority": 5, "ticks": 0}),
        json!({"name": "", "priority": 5, "ticks": 1}),
        json!({"priority": 5, "ticks": 1}),
    ] {
        let resp = client
            .post(server.url("/api/scheduler"))
            .json(&bad)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "payload {}", bad);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["kind"], "invalid_argument");
    }

    let resp = client
        .post(server.url("/api/scheduler/run?ticks=0"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = client
        .get(server.url("/api/scheduler"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["queue"], json!([]));

    server.shutdown();
}

#[tokio::test]
async fn test_cache_get_serves_store_fields() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(server.url("/api/cache/get/2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["item"]["date"], "2025-11-25");
    assert_eq!(body["item"]["time"], "12:30");
    assert_eq!(body["item"]["meal"], "lunch");
    assert_eq!(body["item"]["created_at"], "2025-11-25T12:30:00Z");

    server.shutdown();
}

#[tokio::test]
async fn test_unknown_route_and_wrong_method_keep_error_envelope() {
    let server = start_server().await;
    let client = reqwest::Client::new();

    let resp = client.get(server.url("/api/nope")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["kind"], "not_found");
    assert!(body["error"].as_str().unwrap().contains("/api/nope"));

    let resp = client.get(server.url("/api/cache/put")).send().await.unwrap();
    assert_eq!(resp.status(), 405);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["kind"], "invalid_argument");
    assert!(body["error"].is_string());

    let resp = client
        .delete(server.url("/api/scheduler"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], false);

    server.shutdown();
}
