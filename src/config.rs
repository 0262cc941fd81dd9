use crate::platform::PlatformId;
use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Environments where the collection endpoint may run without a shared secret.
const LOCAL_ENVIRONMENTS: &[&str] = &["local", "dev", "development"];

#[derive(Debug, Clone)]
pub struct Config {
    pub gateway_host: String,
    pub gateway_port: u16,
    pub platform_urls: HashMap<PlatformId, String>,
    pub metadata_url: Option<String>,
    pub cron_secret: Option<String>,
    pub environment: String,
    pub max_connections_per_pool: u32,
    pub pool_timeout: Duration,
    pub analytics_sample_limit: i64,
    pub readiness_sample_table: String,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let gateway_host = env::var("GATEWAY_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let gateway_port = env::var("GATEWAY_PORT")
            .unwrap_or_else(|_| "3002".to_string())
            .parse()
            .unwrap_or(3002);

        // Empty values count as unset, same as a missing variable
        let mut platform_urls = HashMap::new();
        for id in PlatformId::ALL {
            if let Some(url) = non_empty_var(id.env_key()) {
                platform_urls.insert(id, url);
            }
        }

        let metadata_url = non_empty_var("DATABASE_URL_METADATA");
        let cron_secret = non_empty_var("CRON_SECRET");

        let environment = env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string());

        let max_connections_per_pool = env::var("MAX_CONNECTIONS_PER_POOL")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let pool_timeout_secs: u64 = env::var("POOL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let analytics_sample_limit = env::var("ANALYTICS_SAMPLE_LIMIT")
            .unwrap_or_else(|_| "2000".to_string())
            .parse()
            .unwrap_or(2000);

        let readiness_sample_table =
            env::var("READINESS_SAMPLE_TABLE").unwrap_or_else(|_| "public.users".to_string());

        let log_dir = env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./logs"));

        Ok(Config {
            gateway_host,
            gateway_port,
            platform_urls,
            metadata_url,
            cron_secret,
            environment,
            max_connections_per_pool,
            pool_timeout: Duration::from_secs(pool_timeout_secs),
            analytics_sample_limit,
            readiness_sample_table,
            log_dir,
        })
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.gateway_host, self.gateway_port);
        addr.parse().map_err(|e| anyhow::anyhow!("Invalid socket address: {}", e))
    }

    pub fn is_local_environment(&self) -> bool {
        is_local_environment(&self.environment)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_host: "127.0.0.1".to_string(),
            gateway_port: 3002,
            platform_urls: HashMap::new(),
            metadata_url: None,
            cron_secret: None,
            environment: "local".to_string(),
            max_connections_per_pool: 5,
            pool_timeout: Duration::from_secs(10),
            analytics_sample_limit: 2000,
            readiness_sample_table: "public.users".to_string(),
            log_dir: PathBuf::from("./logs"),
        }
    }
}

pub fn is_local_environment(environment: &str) -> bool {
    LOCAL_ENVIRONMENTS
        .iter()
        .any(|e| e.eq_ignore_ascii_case(environment))
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
