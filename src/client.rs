//! WowSQL client entry point.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;

use crate::error::Result;
use crate::query::QueryBuilder;
use crate::storage::WowStorage;
use crate::transport::{HttpTransport, StaticCredentials, Transport};

const TABLES_PATH: &str = "/api/v1/tables";
const HEALTH_PATH: &str = "/health";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub project_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ClientOptions {
    pub fn new(project_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_url: project_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub row_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    pub status: String,
}

/// Client for one WowSQL project.
///
/// Cheap to share behind an `Arc`; each [`table`] call hands out an
/// independent single-owner [`QueryBuilder`].
///
/// [`table`]: WowClient::table
pub struct WowClient {
    transport: Arc<dyn Transport>,
}

impl WowClient {
    /// Connect with a project URL and API key, using default options.
    pub fn connect(project_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(ClientOptions::new(project_url, api_key))
    }

    pub fn with_options(options: ClientOptions) -> Result<Self> {
        let credentials = Arc::new(StaticCredentials::new(options.api_key));
        let transport = HttpTransport::new(options.project_url, credentials, options.timeout)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Build a client over a custom transport, e.g. a mock in tests.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Start a query against a table.
    pub fn table(&self, name: impl Into<String>) -> Result<QueryBuilder> {
        QueryBuilder::new(self.transport.clone(), name)
    }

    /// Storage facade sharing this client's transport and credentials.
    pub fn storage(&self) -> WowStorage {
        WowStorage::new(self.transport.clone())
    }

    /// Names of all tables in the project.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let resp = self
            .transport
            .send(Method::GET, TABLES_PATH, &[], None)
            .await?;
        Ok(serde_json::from_value(resp.body)?)
    }

    /// Column layout and row count of one table.
    pub async fn describe_table(&self, name: &str) -> Result<TableSchema> {
        let path = format!("{}/{}", TABLES_PATH, urlencoding::encode(name));
        let resp = self.transport.send(Method::GET, &path, &[], None).await?;
        Ok(serde_json::from_value(resp.body)?)
    }

    /// Backend health probe.
    pub async fn health(&self) -> Result<Health> {
        let resp = self
            .transport
            .send(Method::GET, HEALTH_PATH, &[], None)
            .await?;
        Ok(serde_json::from_value(resp.body)?)
    }
}
