//! Recording mock transport shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;
use serde_json::{json, Value};
use wowsql::{Result, Transport, TransportResponse, UploadMeta};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub path: String,
    pub file_key: String,
    pub folder: Option<String>,
    pub content_type: String,
    pub size: usize,
}

/// Scripted transport: pops queued responses in order and records every
/// call. With an empty queue it answers with an empty result set.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<TransportResponse>>>,
    pub calls: Mutex<Vec<RecordedCall>>,
    pub uploads: Mutex<Vec<RecordedUpload>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn push_response(&self, status: u16, body: Value) {
        self.responses
            .lock()
            .push_back(Ok(TransportResponse { status, body }));
    }

    pub fn push_error(&self, err: wowsql::Error) {
        self.responses.lock().push_back(Err(err));
    }

    fn next_response(&self) -> Result<TransportResponse> {
        self.responses.lock().pop_front().unwrap_or(Ok(TransportResponse {
            status: 200,
            body: json!({"data": [], "count": 0}),
        }))
    }

    /// Total number of network calls, uploads included.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len() + self.uploads.lock().len()
    }

    pub fn last_call(&self) -> RecordedCall {
        self.calls.lock().last().expect("no calls recorded").clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<TransportResponse> {
        self.calls.lock().push(RecordedCall {
            method: method.to_string(),
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            body,
        });
        self.next_response()
    }

    async fn send_multipart(
        &self,
        path: &str,
        meta: &UploadMeta,
        bytes: Vec<u8>,
    ) -> Result<TransportResponse> {
        self.uploads.lock().push(RecordedUpload {
            path: path.to_string(),
            file_key: meta.file_key.clone(),
            folder: meta.folder.clone(),
            content_type: meta.content_type.clone(),
            size: bytes.len(),
        });
        self.next_response()
    }
}
