use crate::api::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: String,
    environment: String,
    registered_platforms: usize,
    configured_platforms: usize,
    snapshot_store: &'static str,
    uptime_seconds: u64,
}

/// Liveness of the service itself; touches no platform
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let configured = state.registry.list_configured().len();

    Json(HealthResponse {
        status: if configured > 0 {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        environment: state.environment.clone(),
        registered_platforms: state.registry.len(),
        configured_platforms: configured,
        snapshot_store: state.store.backend(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{get, send, test_app};
    use crate::platform::PlatformId;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_service_health() {
        let app = test_app(&[PlatformId::Neon], "local", None);

        let (status, body) = send(&app.router, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["registeredPlatforms"], 4);
        assert_eq!(body["configuredPlatforms"], 1);
        assert_eq!(body["snapshotStore"], "memory");
        assert!(body["uptimeSeconds"].is_u64());
        assert!(body.get("uptime_seconds").is_none());
    }

    #[tokio::test]
    async fn test_degraded_without_platforms() {
        let app = test_app(&[], "local", None);

        let (_, body) = send(&app.router, get("/health")).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["configuredPlatforms"], 0);
    }
}
