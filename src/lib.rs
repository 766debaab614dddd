//! WowSQL Rust Client SDK
//!
//! An HTTP client for WowSQL, a multi-tenant database and object storage
//! backend. Queries are built fluently and sent as a single request; uploads
//! are pre-validated against a cached storage quota before any bytes are
//! transmitted.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use wowsql::WowClient;
//!
//! #[tokio::main]
//! async fn main() -> wowsql::Result<()> {
//!     let client = WowClient::connect("https://myproject.wowsql.com", "api-key")?;
//!
//!     // Query rows
//!     let active = client
//!         .table("users")?
//!         .select(["id", "name", "email"])
//!         .eq("status", "active")
//!         .order_by("name", false)
//!         .limit(5)
//!         .execute()
//!         .await?;
//!     println!("{} active users", active.count);
//!
//!     // Insert a row
//!     client
//!         .table("users")?
//!         .insert(json!({"name": "Alice", "email": "alice@example.com"}))?
//!         .execute()
//!         .await?;
//!
//!     // Upload a file; the quota guard rejects it before any network I/O
//!     // if it would exceed the plan's storage limit.
//!     let storage = client.storage();
//!     let result = storage.upload_from_path("reports/report.pdf", Some("reports")).await?;
//!     println!("uploaded {}", result.file_key);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
pub mod query;
pub mod quota;
pub mod storage;
pub mod transport;

pub use client::{ClientOptions, ColumnInfo, Health, TableSchema, WowClient};
pub use error::{Error, Result};
pub use query::{
    FilterOp, Mutation, MutationKind, OrderSpec, Predicate, QueryBuilder, QueryRequest, ResultSet,
    QUERY_PATH,
};
pub use quota::{QuotaGuard, QuotaSnapshot, QuotaState, DEFAULT_STALENESS_WINDOW, QUOTA_PATH};
pub use storage::{
    FileUrl, StorageInfo, StoredFile, UploadRequest, UploadResult, WowStorage,
    STORAGE_FILES_PATH, STORAGE_INFO_PATH, STORAGE_UPLOAD_PATH,
};
pub use transport::{
    CredentialsProvider, HttpTransport, StaticCredentials, Transport, TransportResponse,
    UploadMeta,
};
