//! Platform Registry
//!
//! Built once at startup and shared read-only with every handler.

use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::platform::handle::{Platform, PoolSettings};
use crate::platform::types::PlatformId;
use futures_util::future::join_all;
use std::sync::Arc;

#[derive(Default)]
pub struct PlatformRegistry {
    platforms: Vec<Arc<Platform>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every known platform, configured or not, in fixed order
    pub fn from_config(config: &Config) -> Self {
        let settings = PoolSettings {
            max_size: config.max_connections_per_pool,
            timeout: config.pool_timeout,
        };

        let mut registry = Self::new();
        for id in PlatformId::ALL {
            registry.register(Platform::new(id, config.platform_urls.get(&id).cloned(), settings));
        }
        registry
    }

    /// Insert, or replace in place when the id is already registered
    pub fn register(&mut self, platform: Platform) {
        let platform = Arc::new(platform);
        match self.platforms.iter_mut().find(|p| p.id() == platform.id()) {
            Some(existing) => *existing = platform,
            None => self.platforms.push(platform),
        }
    }

    pub fn get(&self, id: PlatformId) -> Option<Arc<Platform>> {
        self.platforms.iter().find(|p| p.id() == id).cloned()
    }

    /// Resolve a platform from a request-supplied id
    pub fn lookup(&self, id: &str) -> Result<Arc<Platform>> {
        let platform_id: PlatformId = id.parse()?;
        self.get(platform_id).ok_or_else(|| GatewayError::UnknownPlatform {
            platform: id.to_string(),
        })
    }

    pub fn list_all(&self) -> &[Arc<Platform>] {
        &self.platforms
    }

    pub fn list_configured(&self) -> Vec<Arc<Platform>> {
        self.platforms
            .iter()
            .filter(|p| p.is_configured())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    pub async fn disconnect_all(&self) {
        join_all(self.platforms.iter().map(|p| p.disconnect())).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(urls: &[(PlatformId, &str)]) -> Config {
        let mut config = Config::default();
        for (id, url) in urls {
            config.platform_urls.insert(*id, url.to_string());
        }
        config
    }

    #[test]
    fn test_registers_all_platforms_in_order() {
        let registry = PlatformRegistry::from_config(&Config::default());

        assert_eq!(registry.len(), 4);
        let ids: Vec<PlatformId> = registry.list_all().iter().map(|p| p.id()).collect();
        assert_eq!(ids, PlatformId::ALL.to_vec());
    }

    #[test]
    fn test_get_platform_by_id() {
        let registry = PlatformRegistry::from_config(&Config::default());

        let gcp = registry.get(PlatformId::Gcp).unwrap();
        assert_eq!(gcp.name(), "GCP (Source)");
        assert_eq!(gcp.env_key(), "DATABASE_URL_GCP");

        assert!(registry.lookup("neon").is_ok());
    }

    #[test]
    fn test_lookup_unknown_platform() {
        let registry = PlatformRegistry::from_config(&Config::default());

        match registry.lookup("oracle") {
            Err(GatewayError::UnknownPlatform { platform }) => assert_eq!(platform, "oracle"),
            other => panic!("expected UnknownPlatform, got {:?}", other.map(|p| p.id())),
        }

        // Known id that was never registered
        let empty = PlatformRegistry::new();
        assert!(matches!(
            empty.lookup("gcp"),
            Err(GatewayError::UnknownPlatform { .. })
        ));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_list_configured() {
        let registry = PlatformRegistry::from_config(&config_with(&[
            (PlatformId::Gcp, "postgres://gcp/db"),
            (PlatformId::Supabase, "postgres://supabase/db"),
        ]));

        let configured: Vec<PlatformId> = registry.list_configured().iter().map(|p| p.id()).collect();
        assert_eq!(configured, vec![PlatformId::Gcp, PlatformId::Supabase]);
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = PlatformRegistry::from_config(&Config::default());
        assert!(!registry.get(PlatformId::Local).unwrap().is_configured());

        registry.register(Platform::new(
            PlatformId::Local,
            Some("postgres://localhost/db".to_string()),
            PoolSettings::default(),
        ));

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.list_all()[1].id(), PlatformId::Local);
        assert!(registry.get(PlatformId::Local).unwrap().is_configured());
    }
}
