use crate::error::{GatewayError, Result};
use crate::platform::{create_pool, describe_pg_error, PoolSettings};
use crate::store::{LatencySnapshot, NewSnapshot, SnapshotFilter, SnapshotStore};
use async_trait::async_trait;
use deadpool_postgres::Pool;
use tracing::{debug, info};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS latency_snapshots (
        id SERIAL PRIMARY KEY,
        platform_id VARCHAR(20) NOT NULL,
        environment VARCHAR(20) NOT NULL,
        latency_ms INTEGER NOT NULL,
        ok BOOLEAN NOT NULL,
        error TEXT,
        version TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );
    CREATE INDEX IF NOT EXISTS idx_platform_env ON latency_snapshots (platform_id, environment);
    CREATE INDEX IF NOT EXISTS idx_created_at ON latency_snapshots (created_at);
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO latency_snapshots (platform_id, environment, latency_ms, ok, error, version)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

const SELECT_SQL: &str = r#"
    SELECT id::int8, platform_id::text, environment::text, latency_ms, ok, error, version, created_at
    FROM latency_snapshots
    WHERE created_at >= $1
        AND ($2::text IS NULL OR environment = $2)
        AND ($3::text IS NULL OR platform_id = $3)
    ORDER BY created_at DESC, id DESC
    LIMIT $4
"#;

/// Snapshots kept in the `latency_snapshots` table of the metadata database
pub struct PostgresSnapshotStore {
    pool: Pool,
}

impl PostgresSnapshotStore {
    /// Build the pool and make sure the table exists
    pub async fn connect(database_url: &str, settings: PoolSettings) -> Result<Self> {
        let pool = create_pool(database_url, &settings)?;
        let store = Self { pool };
        store.ensure_table().await?;

        info!("Connected to latency snapshot store");
        Ok(store)
    }

    async fn ensure_table(&self) -> Result<()> {
        let client = self.pool.get().await.map_err(|e| GatewayError::ConnectionFailed {
            platform: "metadata".to_string(),
            cause: e.to_string(),
        })?;

        client
            .batch_execute(CREATE_TABLE_SQL)
            .await
            .map_err(|e| store_error(&e))?;

        Ok(())
    }
}

fn store_error(err: &tokio_postgres::Error) -> GatewayError {
    GatewayError::StoreFailed {
        cause: describe_pg_error(err),
    }
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    async fn insert_many(&self, snapshots: &[NewSnapshot]) -> Result<u64> {
        if snapshots.is_empty() {
            return Ok(0);
        }

        let mut client = self.pool.get().await.map_err(|e| GatewayError::StoreFailed {
            cause: e.to_string(),
        })?;

        // One transaction, so every row gets the same NOW()
        let tx = client.transaction().await.map_err(|e| store_error(&e))?;
        let statement = tx.prepare(INSERT_SQL).await.map_err(|e| store_error(&e))?;

        for snapshot in snapshots {
            tx.execute(
                &statement,
                &[
                    &snapshot.platform_id,
                    &snapshot.environment,
                    &snapshot.latency_ms,
                    &snapshot.ok,
                    &snapshot.error,
                    &snapshot.version,
                ],
            )
            .await
            .map_err(|e| store_error(&e))?;
        }

        tx.commit().await.map_err(|e| store_error(&e))?;

        debug!("Inserted {} latency snapshots", snapshots.len());
        Ok(snapshots.len() as u64)
    }

    async fn query(&self, filter: &SnapshotFilter) -> Result<Vec<LatencySnapshot>> {
        let client = self.pool.get().await.map_err(|e| GatewayError::StoreFailed {
            cause: e.to_string(),
        })?;

        let rows = client
            .query(
                SELECT_SQL,
                &[
                    &filter.since,
                    &filter.environment,
                    &filter.platform_id,
                    &filter.limit,
                ],
            )
            .await
            .map_err(|e| store_error(&e))?;

        Ok(rows
            .iter()
            .map(|row| LatencySnapshot {
                id: row.get(0),
                platform_id: row.get(1),
                environment: row.get(2),
                latency_ms: row.get(3),
                ok: row.get(4),
                error: row.get(5),
                version: row.get(6),
                created_at: row.get(7),
            })
            .collect())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
