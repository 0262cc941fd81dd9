use crate::api::{configured_platform, AppState};
use crate::error::Result;
use crate::platform::{HealthCheckResult, Platform, PlatformId};
use axum::{
    extract::{Path, State},
    Json,
};
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStatus {
    id: PlatformId,
    name: &'static str,
    configured: bool,
    health: Option<HealthCheckResult>,
}

/// Every registered platform with a live health check for the configured ones
pub async fn list_platforms(State(state): State<Arc<AppState>>) -> Json<Vec<PlatformStatus>> {
    let statuses = join_all(state.registry.list_all().iter().map(|p| platform_status(p))).await;
    Json(statuses)
}

async fn platform_status(platform: &Platform) -> PlatformStatus {
    let configured = platform.is_configured();
    let health = if configured {
        Some(
            platform
                .health_check()
                .await
                .unwrap_or_else(|e| HealthCheckResult::unhealthy(0.0, e.to_string())),
        )
    } else {
        None
    };

    PlatformStatus {
        id: platform.id(),
        name: platform.name(),
        configured,
        health,
    }
}

pub async fn platform_health(
    State(state): State<Arc<AppState>>,
    Path(platform_id): Path<String>,
) -> Result<Json<HealthCheckResult>> {
    let platform = configured_platform(&state, &platform_id)?;
    Ok(Json(platform.health_check().await?))
}
