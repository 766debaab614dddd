//! Object storage operations with quota pre-validation.
//!
//! Uploads are checked against the quota guard before any bytes leave the
//! client; a rejection surfaces as [`Error::StorageLimitExceeded`] with the
//! current usage figures, so callers never reconcile a half-uploaded file
//! against a quota failure.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::quota::{QuotaGuard, QuotaSnapshot};
use crate::transport::{Transport, UploadMeta};

/// Endpoint accepting multipart uploads.
pub const STORAGE_UPLOAD_PATH: &str = "/api/v1/storage/upload";

/// Endpoint for file listing, deletion and presigned URLs.
pub const STORAGE_FILES_PATH: &str = "/api/v1/storage/files";

/// Endpoint describing the project's bucket.
pub const STORAGE_INFO_PATH: &str = "/api/v1/storage/info";

/// A candidate upload: the bytes plus object metadata. Transient, not
/// persisted client-side.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub file_key: String,
    pub folder: Option<String>,
    pub content_type: String,
}

impl UploadRequest {
    pub fn new(bytes: Vec<u8>, file_key: impl Into<String>) -> Self {
        Self {
            bytes,
            file_key: file_key.into(),
            folder: None,
            content_type: "application/octet-stream".to_string(),
        }
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResult {
    pub file_key: String,
    pub file_size: u64,
    pub bucket_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredFile {
    pub key: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl StoredFile {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Bucket-level description of a project's storage.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageInfo {
    pub bucket_name: String,
    pub region: String,
    pub status: String,
    #[serde(default)]
    pub total_objects: u64,
    #[serde(default)]
    pub total_size_gb: f64,
}

/// Presigned URL for reading a stored file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileUrl {
    pub file_key: String,
    pub file_url: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Storage operations for one project, composing the quota guard with the
/// transport.
pub struct WowStorage {
    transport: Arc<dyn Transport>,
    quota: QuotaGuard,
    auto_check_quota: bool,
}

impl WowStorage {
    /// Build a storage facade on an existing transport. Quota auto-checking
    /// is on by default.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let quota = QuotaGuard::new(transport.clone());
        Self {
            transport,
            quota,
            auto_check_quota: true,
        }
    }

    /// Enable or disable the pre-upload quota check for [`upload`].
    ///
    /// [`upload`]: WowStorage::upload
    pub fn auto_check_quota(mut self, enabled: bool) -> Self {
        self.auto_check_quota = enabled;
        self
    }

    /// Override how long a quota snapshot counts as fresh.
    pub fn staleness_window(mut self, window: Duration) -> Self {
        self.quota = QuotaGuard::with_staleness_window(self.transport.clone(), window);
        self
    }

    pub fn quota_guard(&self) -> &QuotaGuard {
        &self.quota
    }

    /// Cached quota snapshot, fetching only when none exists or
    /// `force_refresh` is set. See [`QuotaGuard::get_quota`].
    pub async fn get_quota(&self, force_refresh: bool) -> Result<Arc<QuotaSnapshot>> {
        self.quota.get_quota(force_refresh).await
    }

    /// Speculative capacity check against the cached snapshot; no I/O.
    /// Useful for validating a batch's aggregate size up front, then
    /// uploading each file with `check_quota = false`.
    pub fn check_upload_allowed(&self, size_bytes: u64) -> Result<(bool, String)> {
        self.quota.check_upload_allowed(size_bytes)
    }

    /// Upload with the facade's auto-check setting.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResult> {
        self.upload_with_options(request, self.auto_check_quota).await
    }

    /// Upload, optionally skipping the quota check (e.g. when the caller
    /// already validated an aggregate batch size). On a quota rejection no
    /// bytes are transmitted. A successful upload invalidates the cached
    /// snapshot so the next quota read reflects the new usage.
    pub async fn upload_with_options(
        &self,
        request: UploadRequest,
        check_quota: bool,
    ) -> Result<UploadResult> {
        if check_quota {
            let snapshot = self.quota.get_quota(false).await?;
            let (allowed, message) = snapshot.check_upload(request.bytes.len() as u64);
            if !allowed {
                warn!(file_key = %request.file_key, %message, "upload rejected by quota guard");
                return Err(Error::StorageLimitExceeded {
                    message,
                    used_gb: snapshot.used_gb,
                    quota_gb: snapshot.quota_gb,
                    expansion_gb: snapshot.expansion_gb,
                    status_code: 413,
                });
            }
        }

        let UploadRequest {
            bytes,
            file_key,
            folder,
            content_type,
        } = request;
        let meta = UploadMeta {
            file_key,
            folder,
            content_type,
        };

        let resp = self
            .transport
            .send_multipart(STORAGE_UPLOAD_PATH, &meta, bytes)
            .await?;
        let result: UploadResult = serde_json::from_value(resp.body)?;

        debug!(file_key = %result.file_key, size = result.file_size, "upload complete");
        self.quota.invalidate();
        Ok(result)
    }

    /// Read a local file and upload it, inferring the content type from the
    /// extension and using the file name as the key. A missing file fails
    /// with [`Error::NotFound`] before any network call.
    pub async fn upload_from_path(
        &self,
        path: impl AsRef<Path>,
        folder: Option<&str>,
    ) -> Result<UploadResult> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::NotFound(format!(
                "file not found: {}",
                path.display()
            )));
        }
        let file_key = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::NotFound(format!("unusable file name: {}", path.display())))?
            .to_string();

        let bytes = tokio::fs::read(path).await?;
        let mut request =
            UploadRequest::new(bytes, file_key).content_type(content_type_for(path));
        if let Some(folder) = folder {
            request = request.folder(folder);
        }
        self.upload(request).await
    }

    /// Delete a stored file, then invalidate the quota snapshot
    /// unconditionally: deletions always free space.
    pub async fn delete_file(&self, file_key: &str) -> Result<()> {
        let path = format!("{}/{}", STORAGE_FILES_PATH, urlencoding::encode(file_key));
        self.transport.send(Method::DELETE, &path, &[], None).await?;
        self.quota.invalidate();
        Ok(())
    }

    /// Presigned read URL, valid for `expires_in` seconds. Pure pass-through:
    /// the quota guard is not consulted, since the client transmits no bytes.
    pub async fn get_file_url(&self, file_key: &str, expires_in: u64) -> Result<FileUrl> {
        let path = format!(
            "{}/{}/url",
            STORAGE_FILES_PATH,
            urlencoding::encode(file_key)
        );
        let resp = self
            .transport
            .send(
                Method::GET,
                &path,
                &[("expires_in", expires_in.to_string())],
                None,
            )
            .await?;
        Ok(serde_json::from_value(resp.body)?)
    }

    /// Bucket name, region, status and aggregate object figures. Read-only;
    /// the quota guard is not consulted.
    pub async fn get_storage_info(&self) -> Result<StorageInfo> {
        let resp = self
            .transport
            .send(Method::GET, STORAGE_INFO_PATH, &[], None)
            .await?;
        Ok(serde_json::from_value(resp.body)?)
    }

    /// List stored files, optionally restricted to a key prefix.
    pub async fn list_files(&self, prefix: Option<&str>) -> Result<Vec<StoredFile>> {
        let query: Vec<(&str, String)> = match prefix {
            Some(p) => vec![("prefix", p.to_string())],
            None => Vec::new(),
        };
        let resp = self
            .transport
            .send(Method::GET, STORAGE_FILES_PATH, &query, None)
            .await?;
        Ok(serde_json::from_value(resp.body)?)
    }
}

/// Content type by file extension; fall back to a binary stream.
fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("txt") => "text/plain",
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}
