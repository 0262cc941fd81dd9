use crate::error::Result;
use crate::store::{LatencySnapshot, NewSnapshot, SnapshotFilter, SnapshotStore};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

/// Process-local store, used when no metadata database is configured
#[derive(Default)]
pub struct MemorySnapshotStore {
    rows: RwLock<Vec<LatencySnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fully formed snapshot, keeping its timestamp
    pub async fn push(&self, mut snapshot: LatencySnapshot) {
        let mut rows = self.rows.write().await;
        snapshot.id = rows.len() as i64 + 1;
        rows.push(snapshot);
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn insert_many(&self, snapshots: &[NewSnapshot]) -> Result<u64> {
        let created_at = Utc::now();
        let mut rows = self.rows.write().await;

        for snapshot in snapshots {
            let id = rows.len() as i64 + 1;
            rows.push(LatencySnapshot {
                id,
                platform_id: snapshot.platform_id.clone(),
                environment: snapshot.environment.clone(),
                latency_ms: snapshot.latency_ms,
                ok: snapshot.ok,
                error: snapshot.error.clone(),
                version: snapshot.version.clone(),
                created_at,
            });
        }

        Ok(snapshots.len() as u64)
    }

    async fn query(&self, filter: &SnapshotFilter) -> Result<Vec<LatencySnapshot>> {
        let rows = self.rows.read().await;

        let mut matched: Vec<LatencySnapshot> =
            rows.iter().filter(|s| filter.matches(s)).cloned().collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        matched.truncate(filter.limit.max(0) as usize);

        Ok(matched)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
