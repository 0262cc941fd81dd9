use crate::api::AppState;
use crate::platform::{Platform, PlatformId};
use crate::schema::TABLE_COUNT_QUERY;
use axum::{extract::State, Json};
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformReadiness {
    platform_id: PlatformId,
    name: &'static str,
    table_count: i64,
    sample_row_count: i64,
    ready: bool,
}

/// Whether each configured platform has been loaded with data.
///
/// Ready means at least one user table and a non-empty sample table.
pub async fn readiness(State(state): State<Arc<AppState>>) -> Json<Vec<PlatformReadiness>> {
    let sample_sql = format!("SELECT COUNT(*) AS count FROM {}", state.readiness_sample_table);
    let platforms = state.registry.list_configured();

    let results = join_all(platforms.iter().map(|p| platform_readiness(p, &sample_sql))).await;
    Json(results)
}

async fn platform_readiness(platform: &Platform, sample_sql: &str) -> PlatformReadiness {
    let table_count = count(platform, TABLE_COUNT_QUERY).await;
    // Missing sample table counts as empty
    let sample_row_count = if table_count > 0 {
        count(platform, sample_sql).await
    } else {
        0
    };

    PlatformReadiness {
        platform_id: platform.id(),
        name: platform.name(),
        table_count,
        sample_row_count,
        ready: table_count > 0 && sample_row_count > 0,
    }
}

async fn count(platform: &Platform, sql: &str) -> i64 {
    match platform.run_query(sql).await {
        Ok(result) if result.is_ok() => result.first_i64("count").unwrap_or(0),
        Ok(result) => {
            debug!(
                "Readiness count on {} failed: {}",
                platform.id(),
                result.error.unwrap_or_default()
            );
            0
        }
        Err(e) => {
            debug!("Readiness count on {} failed: {}", platform.id(), e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{get, send, test_app};
    use crate::platform::PlatformId;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_unreachable_platforms_are_not_ready() {
        let app = test_app(&[PlatformId::Gcp, PlatformId::Supabase], "local", None);

        let (status, body) = send(&app.router, get("/api/readiness")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([
                { "platformId": "gcp", "name": "GCP (Source)", "tableCount": 0, "sampleRowCount": 0, "ready": false },
                { "platformId": "supabase", "name": "Supabase", "tableCount": 0, "sampleRowCount": 0, "ready": false },
            ])
        );
    }

    #[tokio::test]
    async fn test_no_configured_platforms() {
        let app = test_app(&[], "local", None);

        let (_, body) = send(&app.router, get("/api/readiness")).await;
        assert_eq!(body, json!([]));
    }
}
