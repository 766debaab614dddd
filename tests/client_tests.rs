//! Client tests for the WowSQL Rust SDK.

mod common;

use std::sync::Arc;

use common::MockTransport;
use serde_json::json;
use wowsql::{Error, WowClient};

fn client_with_mock() -> (WowClient, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    (WowClient::with_transport(transport.clone()), transport)
}

#[test]
fn test_table_rejects_empty_name() {
    let (client, transport) = client_with_mock();

    let err = client.table("").unwrap_err();
    assert!(matches!(err, Error::InvalidQueryState(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_list_tables() {
    let (client, transport) = client_with_mock();
    transport.push_response(200, json!(["users", "orders", "sessions"]));

    let tables = client.list_tables().await.unwrap();

    assert_eq!(tables, vec!["users", "orders", "sessions"]);
    let call = transport.last_call();
    assert_eq!(call.method, "GET");
    assert_eq!(call.path, "/api/v1/tables");
}

#[tokio::test]
async fn test_describe_table() {
    let (client, transport) = client_with_mock();
    transport.push_response(
        200,
        json!({
            "name": "users",
            "columns": [
                {"name": "id", "data_type": "integer", "nullable": false},
                {"name": "email", "data_type": "text", "nullable": true},
            ],
            "row_count": 42,
        }),
    );

    let schema = client.describe_table("users").await.unwrap();

    assert_eq!(schema.name, "users");
    assert_eq!(schema.columns.len(), 2);
    assert_eq!(schema.columns[0].name, "id");
    assert!(!schema.columns[0].nullable);
    assert_eq!(schema.row_count, 42);
    assert_eq!(transport.last_call().path, "/api/v1/tables/users");
}

#[tokio::test]
async fn test_health() {
    let (client, transport) = client_with_mock();
    transport.push_response(200, json!({"status": "ok"}));

    let health = client.health().await.unwrap();

    assert_eq!(health.status, "ok");
    assert_eq!(transport.last_call().path, "/health");
}

#[test]
fn test_error_display() {
    let err = Error::InvalidQueryState("two mutation kinds".to_string());
    assert_eq!(format!("{}", err), "Invalid query state: two mutation kinds");

    let err = Error::InvalidPredicate("empty in list".to_string());
    assert_eq!(format!("{}", err), "Invalid predicate: empty in list");

    let err = Error::UnsafeMutation("delete with no predicates".to_string());
    assert!(format!("{}", err).starts_with("Unsafe mutation"));

    let err = Error::Backend {
        status: 500,
        message: "boom".to_string(),
    };
    assert_eq!(format!("{}", err), "Backend error (500): boom");

    let err = Error::Network("timed out".to_string());
    assert_eq!(format!("{}", err), "Network error: timed out");

    let err = Error::QuotaUnavailable;
    assert!(format!("{}", err).contains("get_quota"));
}

#[test]
fn test_storage_limit_error_carries_usage_figures() {
    let err = Error::StorageLimitExceeded {
        message: "Upload of 2.00 GB exceeds storage limit".to_string(),
        used_gb: 9.0,
        quota_gb: 10.0,
        expansion_gb: 0.0,
        status_code: 413,
    };

    assert!(format!("{}", err).contains("exceeds storage limit"));
    match err {
        Error::StorageLimitExceeded {
            used_gb,
            quota_gb,
            status_code,
            ..
        } => {
            assert_eq!(used_gb, 9.0);
            assert_eq!(quota_gb, 10.0);
            assert_eq!(status_code, 413);
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_error_from_io() {
    let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
    let err: Error = io_err.into();
    match err {
        Error::Io(_) => {}
        _ => panic!("Expected Io error"),
    }
}

#[test]
fn test_error_from_json() {
    let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
    let err: Error = json_err.into();
    match err {
        Error::Serialization(_) => {}
        _ => panic!("Expected Serialization error"),
    }
}
