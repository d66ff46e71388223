use super::*;
use lg_core::test_utils::orders_scenario;

fn setup() -> (SnapshotStore, Config, mpsc::Sender<FileEvent>, mpsc::Receiver<FileEvent>) {
    let (tx, rx) = mpsc::channel(8);
    (SnapshotStore::new(orders_scenario()), Config::default(), tx, rx)
}

#[tokio::test]
async fn test_request_line_gets_response() {
    let (store, config, tx, _rx) = setup();
    let line = r#"{"command": "getUpstream", "nodeId": "view:daily_orders", "depth": 1}"#;

    let response = handle_line(line, &store, &config, &tx).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert_eq!(value["nodes"][0]["id"], "table:orders");
}

#[tokio::test]
async fn test_invalid_request_gets_error() {
    let (store, config, tx, _rx) = setup();
    let response = handle_line("not json", &store, &config, &tx).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&response).unwrap();
    assert!(value["error"].as_str().unwrap().starts_with("[Q004]"));
}

#[tokio::test]
async fn test_event_line_is_forwarded() {
    let (store, config, tx, mut rx) = setup();
    let line = r#"{"event": "removed", "path": "orders.sql"}"#;

    assert!(handle_line(line, &store, &config, &tx).await.is_none());
    let event = rx.recv().await.unwrap();
    assert_eq!(event, FileEvent::removed("orders.sql"));
}

#[tokio::test]
async fn test_malformed_event_gets_error() {
    let (store, config, tx, mut rx) = setup();
    let line = r#"{"event": "renamed", "path": "orders.sql"}"#;

    let response = handle_line(line, &store, &config, &tx).await.unwrap();
    assert!(response.contains("malformed file event"));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_blank_line_ignored() {
    let (store, config, tx, _rx) = setup();
    assert!(handle_line("   ", &store, &config, &tx).await.is_none());
}
