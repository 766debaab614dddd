//! WowSQL Rust SDK - storage facade tests: quota-guarded uploads, deletes,
//! presigned URLs and listings.

mod common;

use std::io::Write;
use std::sync::Arc;

use common::MockTransport;
use serde_json::json;
use wowsql::{
    Error, UploadRequest, WowStorage, STORAGE_FILES_PATH, STORAGE_INFO_PATH, STORAGE_UPLOAD_PATH,
};

fn quota_body(quota_gb: f64, used_gb: f64) -> serde_json::Value {
    json!({
        "plan_name": "pro",
        "quota_gb": quota_gb,
        "expansion_gb": 0.0,
        "used_gb": used_gb,
    })
}

fn upload_body(file_key: &str, file_size: u64) -> serde_json::Value {
    json!({
        "file_key": file_key,
        "file_size": file_size,
        "bucket_name": "wowsql-myproject",
    })
}

fn storage_with_mock() -> (WowStorage, Arc<MockTransport>) {
    let transport = Arc::new(MockTransport::new());
    (WowStorage::new(transport.clone()), transport)
}

#[tokio::test]
async fn test_upload_within_quota_transmits_and_invalidates() {
    let (storage, transport) = storage_with_mock();
    transport.push_response(200, quota_body(10.0, 1.0));
    transport.push_response(200, upload_body("images/photo.jpg", 3));
    transport.push_response(200, quota_body(10.0, 1.1));

    let request = UploadRequest::new(vec![1, 2, 3], "photo.jpg")
        .folder("images")
        .content_type("image/jpeg");
    let result = storage.upload(request).await.unwrap();

    assert_eq!(result.file_key, "images/photo.jpg");
    assert_eq!(result.bucket_name, "wowsql-myproject");

    let uploads = storage_uploads(&transport);
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].path, STORAGE_UPLOAD_PATH);
    assert_eq!(uploads[0].file_key, "photo.jpg");
    assert_eq!(uploads[0].folder.as_deref(), Some("images"));
    assert_eq!(uploads[0].size, 3);

    // Snapshot was invalidated: the next plain read refetches and reflects
    // the post-upload usage without force_refresh.
    let quota = storage.get_quota(false).await.unwrap();
    assert_eq!(quota.used_gb, 1.1);
}

#[tokio::test]
async fn test_upload_over_quota_transmits_nothing() {
    let (storage, transport) = storage_with_mock();
    transport.push_response(200, quota_body(10.0, 9.5));

    // 600 MB candidate against 500 MB remaining.
    let oversized = UploadRequest::new(vec![0u8; 600_000_000], "big.bin");
    let err = storage.upload(oversized).await.unwrap_err();

    match err {
        Error::StorageLimitExceeded {
            used_gb,
            quota_gb,
            status_code,
            message,
            ..
        } => {
            assert_eq!(used_gb, 9.5);
            assert_eq!(quota_gb, 10.0);
            assert_eq!(status_code, 413);
            assert!(message.contains("0.50 GB available"), "message: {message}");
        }
        e => panic!("expected StorageLimitExceeded, got {e:?}"),
    }
    // Only the quota fetch hit the network; no upload bytes were sent.
    assert!(storage_uploads(&transport).is_empty());
    assert_eq!(transport.calls.lock().len(), 1);
}

#[tokio::test]
async fn test_upload_skipping_quota_check_makes_no_quota_fetch() {
    let (storage, transport) = storage_with_mock();
    transport.push_response(200, upload_body("batch/file1.txt", 4));

    let request = UploadRequest::new(vec![0u8; 4], "file1.txt").folder("batch");
    storage.upload_with_options(request, false).await.unwrap();

    assert!(transport.calls.lock().is_empty());
    assert_eq!(storage_uploads(&transport).len(), 1);
}

#[tokio::test]
async fn test_batch_preflight_then_unchecked_uploads() {
    let (storage, transport) = storage_with_mock();
    transport.push_response(200, quota_body(10.0, 1.0));

    storage.get_quota(false).await.unwrap();
    let total: u64 = 3 * 1_000_000;
    let (allowed, _) = storage.check_upload_allowed(total).unwrap();
    assert!(allowed);

    for key in ["a.bin", "b.bin", "c.bin"] {
        transport.push_response(200, upload_body(key, 1_000_000));
        let request = UploadRequest::new(vec![0u8; 1_000_000], key);
        storage.upload_with_options(request, false).await.unwrap();
    }

    assert_eq!(storage_uploads(&transport).len(), 3);
    // One quota fetch for the pre-flight, none per upload.
    assert_eq!(transport.calls.lock().len(), 1);
}

#[tokio::test]
async fn test_delete_file_invalidates_quota() {
    let (storage, transport) = storage_with_mock();
    transport.push_response(200, quota_body(10.0, 5.0));
    storage.get_quota(false).await.unwrap();

    transport.push_response(200, json!({"message": "deleted"}));
    transport.push_response(200, quota_body(10.0, 4.2));

    storage.delete_file("old-files/temp.txt").await.unwrap();

    let call = transport.last_call();
    assert_eq!(call.method, "DELETE");
    assert_eq!(
        call.path,
        format!("{}/old-files%2Ftemp.txt", STORAGE_FILES_PATH)
    );

    // available_gb never decreases across a delete.
    let quota = storage.get_quota(false).await.unwrap();
    assert_eq!(quota.used_gb, 4.2);
    assert!(quota.available_gb() >= 5.0);
}

#[tokio::test]
async fn test_get_file_url_skips_quota_guard() {
    let (storage, transport) = storage_with_mock();
    transport.push_response(
        200,
        json!({
            "file_key": "documents/report.pdf",
            "file_url": "https://cdn.wowsql.com/signed/abc123",
        }),
    );

    let url = storage
        .get_file_url("documents/report.pdf", 3600)
        .await
        .unwrap();

    assert_eq!(url.file_key, "documents/report.pdf");
    assert!(url.file_url.starts_with("https://cdn.wowsql.com/"));

    let call = transport.last_call();
    assert_eq!(call.method, "GET");
    assert_eq!(
        call.path,
        format!("{}/documents%2Freport.pdf/url", STORAGE_FILES_PATH)
    );
    assert_eq!(call.query, vec![("expires_in".to_string(), "3600".to_string())]);
    // No quota fetch happened.
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_list_files_forwards_prefix() {
    let (storage, transport) = storage_with_mock();
    transport.push_response(
        200,
        json!([
            {"key": "documents/a.pdf", "size_bytes": 1024},
            {"key": "documents/b.pdf", "size_bytes": 2048},
        ]),
    );

    let files = storage.list_files(Some("documents/")).await.unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files[0].key, "documents/a.pdf");
    let call = transport.last_call();
    assert_eq!(call.path, STORAGE_FILES_PATH);
    assert_eq!(
        call.query,
        vec![("prefix".to_string(), "documents/".to_string())]
    );
}

#[tokio::test]
async fn test_get_storage_info() {
    let (storage, transport) = storage_with_mock();
    transport.push_response(
        200,
        json!({
            "bucket_name": "wowsql-myproject",
            "region": "us-east-1",
            "status": "active",
            "total_objects": 128,
            "total_size_gb": 3.75,
        }),
    );

    let info = storage.get_storage_info().await.unwrap();

    assert_eq!(info.bucket_name, "wowsql-myproject");
    assert_eq!(info.region, "us-east-1");
    assert_eq!(info.status, "active");
    assert_eq!(info.total_objects, 128);
    assert_eq!(info.total_size_gb, 3.75);

    let call = transport.last_call();
    assert_eq!(call.method, "GET");
    assert_eq!(call.path, STORAGE_INFO_PATH);
    // Read-only: no quota fetch alongside.
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_upload_from_path_missing_file_sends_nothing() {
    let (storage, transport) = storage_with_mock();

    let err = storage
        .upload_from_path("/no/such/file.pdf", Some("reports"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_upload_from_path_reads_and_uploads() {
    let (storage, transport) = storage_with_mock();
    transport.push_response(200, quota_body(10.0, 1.0));
    transport.push_response(200, upload_body("reports/notes.txt", 11));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"hello world").unwrap();

    let result = storage
        .upload_from_path(&path, Some("reports"))
        .await
        .unwrap();

    assert_eq!(result.file_size, 11);
    let uploads = storage_uploads(&transport);
    assert_eq!(uploads[0].file_key, "notes.txt");
    assert_eq!(uploads[0].folder.as_deref(), Some("reports"));
    assert_eq!(uploads[0].content_type, "text/plain");
    assert_eq!(uploads[0].size, 11);
}

fn storage_uploads(transport: &MockTransport) -> Vec<common::RecordedUpload> {
    transport.uploads.lock().clone()
}
