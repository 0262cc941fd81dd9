use crate::config::is_local_environment;
use crate::error::GatewayError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Shared-secret check for the latency collection endpoint
#[derive(Clone)]
pub struct CronAuthConfig {
    pub secret: Option<String>,
    pub environment: String,
}

impl CronAuthConfig {
    pub fn new(secret: Option<String>, environment: impl Into<String>) -> Self {
        Self {
            secret,
            environment: environment.into(),
        }
    }

    /// Validate an `Authorization` header value.
    ///
    /// A configured secret is always required. Without one, only the local
    /// environment is let through.
    pub fn verify(&self, authorization: Option<&str>) -> Result<(), GatewayError> {
        let secret = match &self.secret {
            Some(secret) => secret,
            None if is_local_environment(&self.environment) => return Ok(()),
            None => {
                tracing::warn!(
                    "Collection request rejected: CRON_SECRET not set in environment '{}'",
                    self.environment
                );
                return Err(GatewayError::Unauthorized {
                    reason: "CRON_SECRET is not configured".to_string(),
                });
            }
        };

        let token = authorization
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| {
                tracing::warn!("Collection request missing bearer token");
                GatewayError::Unauthorized {
                    reason: "missing bearer token".to_string(),
                }
            })?;

        if !constant_time_compare(token, secret) {
            tracing::warn!("Collection request with invalid bearer token");
            return Err(GatewayError::Unauthorized {
                reason: "invalid bearer token".to_string(),
            });
        }

        Ok(())
    }
}

pub async fn cron_auth_middleware(
    State(config): State<Arc<CronAuthConfig>>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    config.verify(authorization)?;

    Ok(next.run(req).await)
}

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("secret123", "secret123"));
        assert!(!constant_time_compare("secret123", "secret124"));
        assert!(!constant_time_compare("short", "longer"));
        assert!(!constant_time_compare("", "nonempty"));
    }

    #[test]
    fn test_secret_required_when_configured() {
        let config = CronAuthConfig::new(Some("s3cret".to_string()), "local");

        assert!(config.verify(Some("Bearer s3cret")).is_ok());
        assert!(config.verify(Some("Bearer wrong")).is_err());
        assert!(config.verify(Some("s3cret")).is_err());
        assert!(config.verify(None).is_err());
    }

    #[test]
    fn test_local_environment_without_secret() {
        let config = CronAuthConfig::new(None, "local");
        assert!(config.verify(None).is_ok());
    }

    #[test]
    fn test_remote_environment_without_secret_is_rejected() {
        let config = CronAuthConfig::new(None, "firebase");
        assert!(matches!(
            config.verify(Some("Bearer anything")),
            Err(GatewayError::Unauthorized { .. })
        ));
    }
}
