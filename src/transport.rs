//! HTTP transport and credentials for the WowSQL backend.
//!
//! The core never builds HTTP requests directly; it talks to a [`Transport`],
//! which keeps the query builder and quota guard testable against a mock.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// Supplies the bearer token sent with every request.
pub trait CredentialsProvider: Send + Sync {
    fn api_key(&self) -> String;
}

/// A fixed API key. Rotation is out of scope for the client.
pub struct StaticCredentials {
    key: String,
}

impl StaticCredentials {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl CredentialsProvider for StaticCredentials {
    fn api_key(&self) -> String {
        self.key.clone()
    }
}

/// Status and decoded JSON body of a backend response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

/// Metadata accompanying an upload's multipart body.
#[derive(Debug, Clone)]
pub struct UploadMeta {
    pub file_key: String,
    pub folder: Option<String>,
    pub content_type: String,
}

/// Authenticated call into the backend.
///
/// Implementations must surface transport failures (connect, timeout,
/// cancellation) as [`Error::Network`] and non-2xx responses as
/// [`Error::Backend`], so callers can tell the two apart.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<TransportResponse>;

    async fn send_multipart(
        &self,
        path: &str,
        meta: &UploadMeta,
        bytes: Vec<u8>,
    ) -> Result<TransportResponse>;
}

/// reqwest-backed transport. Injects `Authorization: Bearer <key>` from the
/// credentials provider on every call.
pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialsProvider>,
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialsProvider>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn into_response(resp: reqwest::Response) -> Result<TransportResponse> {
        let status = resp.status().as_u16();
        // Tolerate empty or non-JSON bodies (e.g. 204 on delete).
        let body = resp.json::<Value>().await.unwrap_or(Value::Null);

        if !(200..300).contains(&status) {
            let message = body
                .get("error")
                .or_else(|| body.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("request failed")
                .to_string();
            if status == 404 {
                return Err(Error::NotFound(message));
            }
            return Err(Error::Backend { status, message });
        }

        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<TransportResponse> {
        debug!(%method, path, "sending request");

        let mut req = self
            .http
            .request(method, self.url(path))
            .bearer_auth(self.credentials.api_key());
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        Self::into_response(req.send().await?).await
    }

    async fn send_multipart(
        &self,
        path: &str,
        meta: &UploadMeta,
        bytes: Vec<u8>,
    ) -> Result<TransportResponse> {
        debug!(path, file_key = %meta.file_key, size = bytes.len(), "uploading");

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(meta.file_key.clone())
            .mime_str(&meta.content_type)?;
        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("file_key", meta.file_key.clone())
            .text("content_type", meta.content_type.clone());
        if let Some(folder) = &meta.folder {
            form = form.text("folder", folder.clone());
        }

        let req = self
            .http
            .post(self.url(path))
            .bearer_auth(self.credentials.api_key())
            .multipart(form);

        Self::into_response(req.send().await?).await
    }
}
