use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Unknown platform: {platform}")]
    UnknownPlatform { platform: String },

    #[error("{env_key} is not configured")]
    NotConfigured { platform: String, env_key: String },

    #[error("Schema introspection failed for {platform}: {cause}")]
    SchemaIntrospectionFailed { platform: String, cause: String },

    #[error("Connection failed to {platform}: {cause}")]
    ConnectionFailed { platform: String, cause: String },

    #[error("Snapshot store error: {cause}")]
    StoreFailed { cause: String },

    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::UnknownPlatform { .. } => StatusCode::NOT_FOUND,
            GatewayError::NotConfigured { .. } => StatusCode::BAD_REQUEST,
            GatewayError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            GatewayError::ConnectionFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::SchemaIntrospectionFailed { .. }
            | GatewayError::StoreFailed { .. }
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = match &self {
            GatewayError::UnknownPlatform { platform } => ErrorResponse {
                error: "unknown_platform".to_string(),
                message: format!("Unknown platform: {}", platform),
                platform: Some(platform.clone()),
                cause: None,
            },
            GatewayError::NotConfigured { platform, env_key } => ErrorResponse {
                error: "platform_not_configured".to_string(),
                message: format!("{} is not configured ({} is not set)", platform, env_key),
                platform: Some(platform.clone()),
                cause: None,
            },
            // The raw driver message is the message: there is no partial diff to return
            GatewayError::SchemaIntrospectionFailed { platform, cause } => ErrorResponse {
                error: "schema_introspection_failed".to_string(),
                message: cause.clone(),
                platform: Some(platform.clone()),
                cause: None,
            },
            GatewayError::ConnectionFailed { platform, cause } => ErrorResponse {
                error: "connection_failed".to_string(),
                message: format!("Failed to connect to platform '{}'", platform),
                platform: Some(platform.clone()),
                cause: Some(cause.clone()),
            },
            GatewayError::StoreFailed { cause } => ErrorResponse {
                error: "store_failed".to_string(),
                message: "Latency snapshot store operation failed".to_string(),
                platform: None,
                cause: Some(cause.clone()),
            },
            GatewayError::Unauthorized { .. } => ErrorResponse {
                error: "unauthorized".to_string(),
                message: "Unauthorized".to_string(),
                platform: None,
                cause: None,
            },
            GatewayError::InvalidRequest { message } => ErrorResponse {
                error: "invalid_request".to_string(),
                message: message.clone(),
                platform: None,
                cause: None,
            },
            GatewayError::Internal(msg) => ErrorResponse {
                error: "internal_error".to_string(),
                message: msg.clone(),
                platform: None,
                cause: None,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let unknown = GatewayError::UnknownPlatform {
            platform: "oracle".to_string(),
        };
        assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);

        let unconfigured = GatewayError::NotConfigured {
            platform: "Neon".to_string(),
            env_key: "DATABASE_URL_NEON".to_string(),
        };
        assert_eq!(unconfigured.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(unconfigured.to_string(), "DATABASE_URL_NEON is not configured");

        let auth = GatewayError::Unauthorized {
            reason: "bad token".to_string(),
        };
        assert_eq!(auth.status_code(), StatusCode::UNAUTHORIZED);

        let introspection = GatewayError::SchemaIntrospectionFailed {
            platform: "gcp".to_string(),
            cause: "connection refused".to_string(),
        };
        assert_eq!(introspection.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
