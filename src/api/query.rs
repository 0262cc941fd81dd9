use crate::api::{configured_platform, non_empty, resolve_sql, AppState};
use crate::error::{GatewayError, Result};
use crate::platform::QueryResult;
use crate::presets::{PresetQuery, PRESET_QUERIES};
use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub platform_id: Option<String>,
    pub sql: Option<String>,
    pub preset_id: Option<String>,
}

pub async fn run_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResult>> {
    let platform_id = non_empty(request.platform_id);
    let sql = resolve_sql(request.sql, request.preset_id)?;

    let (platform_id, sql) = match (platform_id, sql) {
        (Some(platform_id), Some(sql)) => (platform_id, sql),
        _ => {
            return Err(GatewayError::InvalidRequest {
                message: "platformId and sql are required".to_string(),
            })
        }
    };

    let platform = configured_platform(&state, &platform_id)?;
    debug!("Running query on {}", platform.id());

    Ok(Json(platform.run_query(&sql).await?))
}

pub async fn list_presets() -> Json<&'static [PresetQuery]> {
    Json(PRESET_QUERIES)
}
