use crate::api::{non_empty, AppState};
use crate::error::Result;
use crate::latency::{build_series, stats_by_platform, PlatformStats, SeriesPoint, TimeRange};
use crate::platform::{HealthCheckResult, Platform, PlatformId};
use crate::store::{LatencySnapshot, NewSnapshot, SnapshotFilter};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

const ALL: &str = "all";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectedSnapshot {
    platform_id: PlatformId,
    ok: bool,
    latency_ms: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionResponse {
    inserted: u64,
    environment: String,
    snapshots: Vec<CollectedSnapshot>,
}

/// Health-check every configured platform and append one snapshot each.
///
/// Mounted behind the cron bearer-token middleware.
pub async fn collect_latency(State(state): State<Arc<AppState>>) -> Result<Json<CollectionResponse>> {
    let platforms = state.registry.list_configured();
    let checks = join_all(platforms.iter().map(|p| check(p))).await;

    let snapshots: Vec<NewSnapshot> = checks
        .iter()
        .map(|(id, health)| NewSnapshot {
            platform_id: id.to_string(),
            environment: state.environment.clone(),
            latency_ms: health.latency_ms.round() as i32,
            ok: health.ok,
            error: health.error.clone(),
            version: health.version.clone(),
        })
        .collect();

    let inserted = if snapshots.is_empty() {
        0
    } else {
        state.store.insert_many(&snapshots).await?
    };

    info!(
        "Collected {} latency snapshots for environment '{}'",
        inserted, state.environment
    );

    Ok(Json(CollectionResponse {
        inserted,
        environment: state.environment.clone(),
        snapshots: snapshots
            .iter()
            .zip(checks.iter())
            .map(|(snapshot, (id, _))| CollectedSnapshot {
                platform_id: *id,
                ok: snapshot.ok,
                latency_ms: snapshot.latency_ms,
            })
            .collect(),
    }))
}

async fn check(platform: &Platform) -> (PlatformId, HealthCheckResult) {
    let health = platform
        .health_check()
        .await
        .unwrap_or_else(|e| HealthCheckResult::unhealthy(0.0, e.to_string()));
    (platform.id(), health)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsParams {
    pub time_range: Option<String>,
    pub environment: Option<String>,
    pub platform_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    time_range: TimeRange,
    environment: String,
    platform_id: String,
    count: usize,
    stats: BTreeMap<String, PlatformStats>,
    series: Vec<SeriesPoint>,
    snapshots: Vec<LatencySnapshot>,
}

/// Summary statistics and a time series over stored snapshots
pub async fn latency_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<AnalyticsResponse>> {
    let time_range = match non_empty(params.time_range) {
        Some(raw) => raw.parse::<TimeRange>()?,
        None => TimeRange::default(),
    };
    let environment = non_empty(params.environment).filter(|e| e != ALL);
    let platform_id = non_empty(params.platform_id).filter(|p| p != ALL);

    let filter = SnapshotFilter {
        since: time_range.since(Utc::now()),
        environment: environment.clone(),
        platform_id: platform_id.clone(),
        limit: state.analytics_sample_limit,
    };
    let snapshots = state.store.query(&filter).await?;

    Ok(Json(AnalyticsResponse {
        time_range,
        environment: environment.unwrap_or_else(|| ALL.to_string()),
        platform_id: platform_id.unwrap_or_else(|| ALL.to_string()),
        count: snapshots.len(),
        stats: stats_by_platform(&snapshots),
        series: build_series(&snapshots),
        snapshots,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{get, post_json, send, test_app};
    use crate::platform::PlatformId;
    use crate::store::LatencySnapshot;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn cron_request(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/api/cron/latency");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn snapshot(platform: &str, environment: &str, latency_ms: i32, minutes_ago: i64) -> LatencySnapshot {
        LatencySnapshot {
            id: 0,
            platform_id: platform.to_string(),
            environment: environment.to_string(),
            latency_ms,
            ok: true,
            error: None,
            version: Some("PostgreSQL 16.2".to_string()),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_wrong_token_is_rejected_and_nothing_inserted() {
        let app = test_app(&[PlatformId::Gcp], "production", Some("s3cret"));

        let (status, body) = send(&app.router, cron_request(Some("guess"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized");

        let (status, _) = send(&app.router, cron_request(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        assert!(app.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_secret_outside_local_is_rejected() {
        let app = test_app(&[PlatformId::Gcp], "firebase", None);

        let (status, _) = send(&app.router, cron_request(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(app.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_collects_one_snapshot_per_configured_platform() {
        let app = test_app(&[PlatformId::Gcp, PlatformId::Neon], "production", Some("s3cret"));

        let (status, body) = send(&app.router, cron_request(Some("s3cret"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["inserted"], 2);
        assert_eq!(body["environment"], "production");

        let snapshots = body["snapshots"].as_array().unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0]["platformId"], "gcp");
        assert_eq!(snapshots[0]["ok"], false);
        assert!(snapshots[0]["latencyMs"].is_i64());

        assert_eq!(app.store.len().await, 2);
    }

    #[tokio::test]
    async fn test_local_without_secret_is_open() {
        let app = test_app(&[PlatformId::Local], "local", None);

        let (status, body) = send(&app.router, post_json("/api/cron/latency", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["inserted"], 1);
        assert_eq!(body["environment"], "local");
    }

    #[tokio::test]
    async fn test_analytics_invalid_time_range() {
        let app = test_app(&[], "local", None);

        let (status, body) = send(&app.router, get("/api/analytics/latency?timeRange=2w")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid timeRange: 2w. Use 1h, 24h, 7d, or 30d");
    }

    #[tokio::test]
    async fn test_analytics_defaults_and_stats() {
        let app = test_app(&[], "local", None);
        for (latency, minutes_ago) in [(10, 5), (20, 10), (30, 15), (40, 20), (50, 25)] {
            app.store.push(snapshot("neon", "production", latency, minutes_ago)).await;
        }
        app.store.push(snapshot("gcp", "production", 12, 5)).await;
        // Outside the default 24h window
        app.store.push(snapshot("gcp", "production", 999, 60 * 48)).await;

        let (status, body) = send(&app.router, get("/api/analytics/latency")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timeRange"], "24h");
        assert_eq!(body["environment"], "all");
        assert_eq!(body["platformId"], "all");
        assert_eq!(body["count"], 6);

        let neon = &body["stats"]["neon"];
        assert_eq!(neon["avg"], 30);
        assert_eq!(neon["min"], 10);
        assert_eq!(neon["max"], 50);
        assert_eq!(neon["p95"], 50);
        assert_eq!(neon["count"], 5);
        assert_eq!(body["stats"]["gcp"]["max"], 12);

        let series = body["series"].as_array().unwrap();
        assert_eq!(series.len(), 6);
        assert_eq!(series[0]["neon"], 50);

        let snapshots = body["snapshots"].as_array().unwrap();
        assert_eq!(snapshots.len(), 6);
    }

    #[tokio::test]
    async fn test_analytics_filters() {
        let app = test_app(&[], "local", None);
        app.store.push(snapshot("neon", "production", 40, 5)).await;
        app.store.push(snapshot("neon", "local", 8, 5)).await;
        app.store.push(snapshot("gcp", "production", 12, 5)).await;

        let (_, body) = send(
            &app.router,
            get("/api/analytics/latency?timeRange=1h&environment=production&platformId=neon"),
        )
        .await;
        assert_eq!(body["timeRange"], "1h");
        assert_eq!(body["environment"], "production");
        assert_eq!(body["platformId"], "neon");
        assert_eq!(body["count"], 1);
        assert_eq!(body["snapshots"][0]["latencyMs"], 40);

        let (_, body) = send(
            &app.router,
            get("/api/analytics/latency?environment=all&platformId=all"),
        )
        .await;
        assert_eq!(body["count"], 3);
    }
}
