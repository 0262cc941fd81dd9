//! Snapshot Store
//!
//! Append-only storage for latency snapshots. One row is written per
//! platform per collection run; rows are never updated.

mod memory;
mod postgres;

pub use memory::MemorySnapshotStore;
pub use postgres::PostgresSnapshotStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default cap on rows returned by an analytics query
pub const DEFAULT_SAMPLE_LIMIT: i64 = 2000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LatencySnapshot {
    pub id: i64,
    pub platform_id: String,
    pub environment: String,
    pub latency_ms: i32,
    pub ok: bool,
    pub error: Option<String>,
    pub version: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A snapshot ready to be appended; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewSnapshot {
    pub platform_id: String,
    pub environment: String,
    pub latency_ms: i32,
    pub ok: bool,
    pub error: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SnapshotFilter {
    pub since: DateTime<Utc>,
    pub environment: Option<String>,
    pub platform_id: Option<String>,
    pub limit: i64,
}

impl SnapshotFilter {
    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            since,
            environment: None,
            platform_id: None,
            limit: DEFAULT_SAMPLE_LIMIT,
        }
    }

    fn matches(&self, snapshot: &LatencySnapshot) -> bool {
        snapshot.created_at >= self.since
            && self
                .environment
                .as_ref()
                .map_or(true, |env| &snapshot.environment == env)
            && self
                .platform_id
                .as_ref()
                .map_or(true, |id| &snapshot.platform_id == id)
    }
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Append all snapshots under one timestamp; returns rows written
    async fn insert_many(&self, snapshots: &[NewSnapshot]) -> Result<u64>;

    /// Snapshots matching `filter`, newest first, at most `filter.limit`
    async fn query(&self, filter: &SnapshotFilter) -> Result<Vec<LatencySnapshot>>;

    fn backend(&self) -> &'static str;
}
