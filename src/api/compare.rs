use crate::api::{non_empty, resolve_sql, AppState};
use crate::error::{GatewayError, Result};
use crate::platform::{Platform, PlatformId, QueryResult};
use crate::schema::{diff_schemas, summarize, DiffSummary, SchemaDiffEntry, SchemaInfo};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub left_id: Option<String>,
    pub right_id: Option<String>,
    pub sql: Option<String>,
    pub preset_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaCompareRequest {
    pub left_id: Option<String>,
    pub right_id: Option<String>,
}

/// A query result tagged with the platform it ran on
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedQueryResult {
    platform_id: PlatformId,
    name: &'static str,
    #[serde(flatten)]
    result: QueryResult,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    left: TaggedQueryResult,
    right: TaggedQueryResult,
    row_count_match: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSide {
    platform_id: PlatformId,
    name: &'static str,
    table_count: usize,
    latency_ms: f64,
}

#[derive(Serialize)]
pub struct SchemaCompareResponse {
    left: SchemaSide,
    right: SchemaSide,
    summary: DiffSummary,
    diff: Vec<SchemaDiffEntry>,
}

/// Validate both ids: unknown ids first (left, then right), then configuration
fn resolve_pair(state: &AppState, left_id: &str, right_id: &str) -> Result<(Arc<Platform>, Arc<Platform>)> {
    let left = state.registry.lookup(left_id)?;
    let right = state.registry.lookup(right_id)?;
    left.ensure_configured()?;
    right.ensure_configured()?;
    Ok((left, right))
}

/// Run the same SQL on two platforms concurrently
pub async fn compare_data(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<CompareResponse>> {
    let left_id = non_empty(request.left_id);
    let right_id = non_empty(request.right_id);
    let sql = resolve_sql(request.sql, request.preset_id)?;

    let (left_id, right_id, sql) = match (left_id, right_id, sql) {
        (Some(l), Some(r), Some(sql)) => (l, r, sql),
        _ => {
            return Err(GatewayError::InvalidRequest {
                message: "leftId, rightId, and sql are required".to_string(),
            })
        }
    };

    let (left, right) = resolve_pair(&state, &left_id, &right_id)?;
    debug!("Comparing query on {} and {}", left.id(), right.id());

    let (left_result, right_result) = tokio::join!(left.run_query(&sql), right.run_query(&sql));
    let (left_result, right_result) = (left_result?, right_result?);

    let row_count_match =
        left_result.is_ok() && right_result.is_ok() && left_result.row_count == right_result.row_count;

    Ok(Json(CompareResponse {
        left: TaggedQueryResult {
            platform_id: left.id(),
            name: left.name(),
            result: left_result,
        },
        right: TaggedQueryResult {
            platform_id: right.id(),
            name: right.name(),
            result: right_result,
        },
        row_count_match,
    }))
}

/// Introspect two platforms concurrently and diff their schemas
pub async fn compare_schema(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SchemaCompareRequest>,
) -> Result<Json<SchemaCompareResponse>> {
    let (left_id, right_id) = match (non_empty(request.left_id), non_empty(request.right_id)) {
        (Some(l), Some(r)) => (l, r),
        _ => {
            return Err(GatewayError::InvalidRequest {
                message: "leftId and rightId are required".to_string(),
            })
        }
    };

    let (left, right) = resolve_pair(&state, &left_id, &right_id)?;

    let (left_schema, right_schema) = tokio::join!(left.get_schema(), right.get_schema());
    let (left_schema, right_schema) = match (left_schema, right_schema) {
        (Ok(l), Ok(r)) => (l, r),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Schema comparison {} vs {} failed: {}", left.id(), right.id(), e);
            return Err(e);
        }
    };

    let diff = diff_schemas(&left_schema, &right_schema);
    let summary = summarize(&diff);
    debug!(
        "Schema diff {} vs {}: {} tables, {} matching",
        left.id(),
        right.id(),
        summary.total,
        summary.matching
    );

    Ok(Json(SchemaCompareResponse {
        left: schema_side(&left, &left_schema),
        right: schema_side(&right, &right_schema),
        summary,
        diff,
    }))
}

fn schema_side(platform: &Platform, schema: &SchemaInfo) -> SchemaSide {
    SchemaSide {
        platform_id: platform.id(),
        name: platform.name(),
        table_count: schema.tables.len(),
        latency_ms: schema.latency_ms,
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{post_json, send, test_app, test_app_with_urls, UNREACHABLE_URL};
    use crate::platform::PlatformId;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_compare_requires_all_fields() {
        let app = test_app(&[PlatformId::Gcp, PlatformId::Neon], "local", None);

        let (status, body) = send(
            &app.router,
            post_json("/api/compare", json!({ "leftId": "gcp", "rightId": "neon" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "leftId, rightId, and sql are required");
    }

    #[tokio::test]
    async fn test_compare_unknown_platform_names_the_id() {
        let app = test_app(&[PlatformId::Gcp], "local", None);

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/compare",
                json!({ "leftId": "gcp", "rightId": "oracle", "sql": "SELECT 1" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Unknown platform: oracle");
        assert_eq!(body["platform"], "oracle");
    }

    #[tokio::test]
    async fn test_unknown_id_reported_before_unconfigured() {
        // neon is unconfigured, but the unknown right id wins
        let app = test_app(&[], "local", None);

        let (status, _) = send(
            &app.router,
            post_json(
                "/api/compare",
                json!({ "leftId": "neon", "rightId": "oracle", "sql": "SELECT 1" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_compare_unconfigured_platform() {
        let app = test_app(&[PlatformId::Gcp], "local", None);

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/compare",
                json!({ "leftId": "gcp", "rightId": "supabase", "sql": "SELECT 1" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["platform"], "Supabase");
    }

    #[tokio::test]
    async fn test_compare_unreachable_platforms_report_errors_as_data() {
        let app = test_app(&[PlatformId::Gcp, PlatformId::Local], "local", None);

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/compare",
                json!({ "leftId": "gcp", "rightId": "local", "sql": "SELECT 1" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["left"]["platformId"], "gcp");
        assert_eq!(body["left"]["name"], "GCP (Source)");
        assert!(body["left"]["error"].is_string());
        assert_eq!(body["right"]["platformId"], "local");
        assert_eq!(body["right"]["rowCount"], 0);
        assert_eq!(body["rowCountMatch"], false);
    }

    #[tokio::test]
    async fn test_compare_malformed_connection_string_fails_one_side() {
        let app = test_app_with_urls(
            &[(PlatformId::Gcp, UNREACHABLE_URL), (PlatformId::Neon, "not a url at all")],
            "local",
            None,
        );

        let (status, body) = send(
            &app.router,
            post_json(
                "/api/compare",
                json!({ "leftId": "gcp", "rightId": "neon", "sql": "SELECT 1" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["right"]["platformId"], "neon");
        assert!(body["right"]["error"]
            .as_str()
            .unwrap()
            .contains("Failed to create pool"));
        assert_eq!(body["right"]["rows"], json!([]));
        assert_eq!(body["left"]["platformId"], "gcp");
        assert_eq!(body["rowCountMatch"], false);
    }

    #[tokio::test]
    async fn test_schema_compare_validation() {
        let app = test_app(&[PlatformId::Gcp], "local", None);

        let (status, body) = send(
            &app.router,
            post_json("/api/compare/schema", json!({ "leftId": "gcp" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "leftId and rightId are required");

        let (status, _) = send(
            &app.router,
            post_json("/api/compare/schema", json!({ "leftId": "gcp", "rightId": "neon" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_schema_compare_unreachable_is_server_error() {
        let app = test_app(&[PlatformId::Gcp, PlatformId::Neon], "local", None);

        let (status, body) = send(
            &app.router,
            post_json("/api/compare/schema", json!({ "leftId": "gcp", "rightId": "neon" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "schema_introspection_failed");
        assert!(!body["message"].as_str().unwrap().is_empty());
    }
}
