//! Storage quota snapshot and client-side quota guard.
//!
//! The guard caches one immutable [`QuotaSnapshot`] at a time and serves it
//! even when stale; it refreshes only on demand (`Unknown` state or
//! `force_refresh`) and is invalidated after storage mutations. Serving a
//! stale snapshot is a deliberate eventual-consistency trade-off, not a bug.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Endpoint returning the project's quota figures.
pub const QUOTA_PATH: &str = "/api/v1/storage/quota";

/// How long a snapshot counts as fresh before being tagged stale.
pub const DEFAULT_STALENESS_WINDOW: Duration = Duration::from_secs(60);

const BYTES_PER_GB: f64 = 1_000_000_000.0;

/// Last-fetched, immutable view of a project's storage usage and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    pub plan_name: String,
    pub quota_gb: f64,
    #[serde(default)]
    pub expansion_gb: f64,
    pub used_gb: f64,
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
}

impl QuotaSnapshot {
    pub fn total_gb(&self) -> f64 {
        self.quota_gb + self.expansion_gb
    }

    pub fn available_gb(&self) -> f64 {
        self.total_gb() - self.used_gb
    }

    pub fn usage_percentage(&self) -> f64 {
        let total = self.total_gb();
        if total <= 0.0 {
            return 0.0;
        }
        self.used_gb / total * 100.0
    }

    pub fn is_enterprise(&self) -> bool {
        self.plan_name.eq_ignore_ascii_case("enterprise")
    }

    /// Only the enterprise plan can purchase expansion storage.
    pub fn can_expand(&self) -> bool {
        self.is_enterprise()
    }

    /// Pure capacity check, no I/O. An upload is allowed iff the used space
    /// plus its size fits within quota and expansion; exactly filling the
    /// remainder is allowed (non-strict inequality).
    pub fn check_upload(&self, size_bytes: u64) -> (bool, String) {
        let size_gb = size_bytes as f64 / BYTES_PER_GB;
        let allowed = self.used_gb + size_gb <= self.total_gb();
        let message = if allowed {
            format!(
                "Upload of {:.2} GB allowed: {:.2} GB available",
                size_gb,
                self.available_gb()
            )
        } else {
            format!(
                "Upload of {:.2} GB exceeds storage limit: {:.2} GB available ({:.2} GB used of {:.2} GB)",
                size_gb,
                self.available_gb(),
                self.used_gb,
                self.total_gb()
            )
        };
        (allowed, message)
    }
}

/// Guard cache state, tagged explicitly rather than inferred from timestamps
/// at call sites.
#[derive(Debug, Clone)]
pub enum QuotaState {
    /// No snapshot fetched yet (or invalidated after a mutation).
    Unknown,
    /// Snapshot fetched within the staleness window.
    Fresh(Arc<QuotaSnapshot>),
    /// Snapshot past the window, still served as a heuristic.
    Stale(Arc<QuotaSnapshot>),
}

impl QuotaState {
    pub fn snapshot(&self) -> Option<Arc<QuotaSnapshot>> {
        match self {
            QuotaState::Unknown => None,
            QuotaState::Fresh(s) | QuotaState::Stale(s) => Some(s.clone()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, QuotaState::Unknown)
    }
}

/// Decides whether uploads fit within the cached quota, and owns the
/// refresh policy.
///
/// Snapshots are immutable and shared as `Arc`s, so concurrent readers are
/// fine; a refresh swaps the whole state value under a short write lock that
/// is never held across an await point. A fetch that fails or is cancelled
/// leaves the previous state untouched.
pub struct QuotaGuard {
    transport: Arc<dyn Transport>,
    state: RwLock<QuotaState>,
    staleness_window: Duration,
}

impl QuotaGuard {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_staleness_window(transport, DEFAULT_STALENESS_WINDOW)
    }

    pub fn with_staleness_window(transport: Arc<dyn Transport>, window: Duration) -> Self {
        Self {
            transport,
            state: RwLock::new(QuotaState::Unknown),
            staleness_window: window,
        }
    }

    /// Current cache state, for inspection.
    pub fn state(&self) -> QuotaState {
        self.state.read().clone()
    }

    fn past_window(&self, snapshot: &QuotaSnapshot) -> bool {
        Utc::now()
            .signed_duration_since(snapshot.fetched_at)
            .to_std()
            .map(|elapsed| elapsed > self.staleness_window)
            .unwrap_or(false)
    }

    /// Return the cached snapshot, fetching only when none exists yet or
    /// `force_refresh` is set. A snapshot past the staleness window is
    /// demoted to `Stale` but still returned; the guard never refreshes
    /// implicitly on a read.
    pub async fn get_quota(&self, force_refresh: bool) -> Result<Arc<QuotaSnapshot>> {
        if !force_refresh {
            // Fast path under the read lock; the write lock is taken only
            // when a Fresh snapshot has outlived its window and needs the
            // Stale tag.
            let (cached, demote) = {
                let state = self.state.read();
                match &*state {
                    QuotaState::Unknown => (None, false),
                    QuotaState::Stale(snap) => (Some(snap.clone()), false),
                    QuotaState::Fresh(snap) => {
                        (Some(snap.clone()), self.past_window(snap))
                    }
                }
            };
            if demote {
                self.demote_to_stale();
            }
            if let Some(snapshot) = cached {
                return Ok(snapshot);
            }
        }
        self.refresh().await
    }

    /// Tag a window-expired Fresh snapshot as Stale. Re-checks under the
    /// write lock: another caller may have refreshed or invalidated in
    /// between.
    fn demote_to_stale(&self) {
        let mut state = self.state.write();
        if let QuotaState::Fresh(snap) = &*state {
            if self.past_window(snap) {
                debug!("quota snapshot passed staleness window");
                let snap = snap.clone();
                *state = QuotaState::Stale(snap);
            }
        }
    }

    /// Fetch a new snapshot and install it atomically.
    async fn refresh(&self) -> Result<Arc<QuotaSnapshot>> {
        let resp = self
            .transport
            .send(Method::GET, QUOTA_PATH, &[], None)
            .await?;

        let mut snapshot: QuotaSnapshot = serde_json::from_value(resp.body)?;
        snapshot.fetched_at = Utc::now();
        let snapshot = Arc::new(snapshot);

        debug!(
            plan = %snapshot.plan_name,
            used_gb = snapshot.used_gb,
            "quota snapshot refreshed"
        );
        *self.state.write() = QuotaState::Fresh(snapshot.clone());
        Ok(snapshot)
    }

    /// Synchronous capacity check against the cached snapshot (fresh or
    /// stale). Never performs I/O, so it is safe to call speculatively, e.g.
    /// on a batch's aggregate size before any individual upload. Fails with
    /// [`Error::QuotaUnavailable`] when no snapshot has been fetched yet.
    pub fn check_upload_allowed(&self, size_bytes: u64) -> Result<(bool, String)> {
        let snapshot = self
            .state
            .read()
            .snapshot()
            .ok_or(Error::QuotaUnavailable)?;
        Ok(snapshot.check_upload(size_bytes))
    }

    /// Drop the cached snapshot. Called after every successful upload or
    /// delete so the next `get_quota` re-fetches and reflects post-mutation
    /// usage instead of a stale figure.
    pub fn invalidate(&self) {
        *self.state.write() = QuotaState::Unknown;
    }
}
