use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The fixed set of deployments the dashboard compares.
///
/// `Gcp` is the source of truth; the others are replica or migration targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformId {
    Gcp,
    Local,
    Neon,
    Supabase,
}

impl PlatformId {
    /// Registration order
    pub const ALL: [PlatformId; 4] = [
        PlatformId::Gcp,
        PlatformId::Local,
        PlatformId::Neon,
        PlatformId::Supabase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Gcp => "gcp",
            PlatformId::Local => "local",
            PlatformId::Neon => "neon",
            PlatformId::Supabase => "supabase",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlatformId::Gcp => "GCP (Source)",
            PlatformId::Local => "Local Docker",
            PlatformId::Neon => "Neon",
            PlatformId::Supabase => "Supabase",
        }
    }

    /// Environment variable holding the platform's connection string
    pub fn env_key(&self) -> &'static str {
        match self {
            PlatformId::Gcp => "DATABASE_URL_GCP",
            PlatformId::Local => "DATABASE_URL_LOCAL",
            PlatformId::Neon => "DATABASE_URL_NEON",
            PlatformId::Supabase => "DATABASE_URL_SUPABASE",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| GatewayError::UnknownPlatform {
                platform: s.to_string(),
            })
    }
}

/// Outcome of a `SELECT version()` round-trip
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub ok: bool,
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthCheckResult {
    pub fn healthy(latency_ms: f64, version: String) -> Self {
        Self {
            ok: true,
            latency_ms,
            version: Some(version),
            error: None,
        }
    }

    pub fn unhealthy(latency_ms: f64, error: String) -> Self {
        Self {
            ok: false,
            latency_ms,
            version: None,
            error: Some(error),
        }
    }
}

/// Full result of an ad-hoc query.
///
/// Failures are carried in `error` with zero rows; callers check the field
/// rather than relying on an `Err`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub rows: Vec<serde_json::Map<String, Value>>,
    pub row_count: u64,
    pub fields: Vec<String>,
    pub latency_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    pub fn failed(latency_ms: f64, error: String) -> Self {
        Self {
            rows: Vec::new(),
            row_count: 0,
            fields: Vec::new(),
            latency_ms,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// First row's value for `field`, read as an integer.
    ///
    /// Accepts JSON numbers and numeric strings (NUMERIC columns decode to text).
    pub fn first_i64(&self, field: &str) -> Option<i64> {
        match self.rows.first()?.get(field)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
