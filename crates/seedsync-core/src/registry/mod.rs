//! Plugin-based provider registry
//!
//! The registry allows DNS providers and node sources to be registered
//! dynamically at runtime, avoiding hardcoded if-else chains.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use seedsync_core::registry::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! seedsync_provider_cloudflare::register(&registry);
//! seedsync_rpc::register(&registry);
//!
//! let zone = config.zone.to_context()?;
//! let provider = registry.create_provider(&config.provider, zone).await?;
//! let source = registry.create_node_source(&config.source)?;
//! ```

use crate::config::{NodeSourceConfig, ProviderConfig};
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory, NodeSource, NodeSourceFactory};
use crate::zone::ZoneContext;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Registry for plugin-based DNS provider and node source creation
///
/// The registry maintains maps of type names to factory objects,
/// allowing dynamic instantiation based on configuration.
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct ProviderRegistry {
    /// Registered DNS provider factories
    providers: RwLock<HashMap<String, Arc<dyn DnsProviderFactory>>>,

    /// Registered node source factories
    node_sources: RwLock<HashMap<String, Box<dyn NodeSourceFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a DNS provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider type name (e.g., "cloudflare")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn DnsProviderFactory>) {
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        providers.insert(name.into(), Arc::from(factory));
    }

    /// Register a node source factory
    ///
    /// # Parameters
    ///
    /// - `name`: Node source type name (e.g., "monero_rpc", "static")
    /// - `factory`: Factory object for creating node source instances
    pub fn register_node_source(
        &self,
        name: impl Into<String>,
        factory: Box<dyn NodeSourceFactory>,
    ) {
        let mut sources = self
            .node_sources
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        sources.insert(name.into(), factory);
    }

    /// Create a DNS provider bound to `zone`
    ///
    /// This resolves the backend zone identifier, so it performs network
    /// I/O and fails with [`Error::ZoneNotFound`] on a misconfigured domain.
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If provider type is not registered or creation fails
    pub async fn create_provider(
        &self,
        config: &ProviderConfig,
        zone: ZoneContext,
    ) -> Result<Box<dyn DnsProvider>> {
        let provider_type = config.type_name();

        let factory = {
            let providers = self
                .providers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            providers
                .get(provider_type)
                .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?
                .clone()
        };

        // Lock released before the async create
        factory.create(config, zone).await
    }

    /// Create a node source from configuration
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn NodeSource>)`: Created node source instance
    /// - `Err(Error)`: If source type is not registered or creation fails
    pub fn create_node_source(&self, config: &NodeSourceConfig) -> Result<Box<dyn NodeSource>> {
        let source_type = config.type_name();
        let sources = self
            .node_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = sources
            .get(source_type)
            .ok_or_else(|| Error::config(format!("Unknown node source type: {}", source_type)))?;

        factory.create(config)
    }

    /// List all registered provider types
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        providers.keys().cloned().collect()
    }

    /// List all registered node source types
    pub fn list_node_sources(&self) -> Vec<String> {
        let sources = self
            .node_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        sources.keys().cloned().collect()
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }

    /// Check if a node source type is registered
    pub fn has_node_source(&self, name: &str) -> bool {
        let sources = self
            .node_sources
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        sources.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProviderFactory;

    #[async_trait::async_trait]
    impl DnsProviderFactory for MockProviderFactory {
        async fn create(
            &self,
            _config: &ProviderConfig,
            zone: ZoneContext,
        ) -> Result<Box<dyn DnsProvider>> {
            Err(Error::zone_not_found(zone.domain_name()))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ProviderRegistry::new();

        // Initially empty
        assert!(!registry.has_provider("mock"));

        // Register
        registry.register_provider("mock", Box::new(MockProviderFactory));

        // Now present
        assert!(registry.has_provider("mock"));
        assert!(registry.list_providers().contains(&"mock".to_string()));
    }

    #[tokio::test]
    async fn unknown_provider_is_a_config_error() {
        let registry = ProviderRegistry::new();
        let zone = ZoneContext::new("example.com", Some("node")).unwrap();

        let result = registry
            .create_provider(&ProviderConfig::cloudflare_token("token"), zone)
            .await;

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn factory_errors_propagate() {
        let registry = ProviderRegistry::new();
        registry.register_provider("cloudflare", Box::new(MockProviderFactory));
        let zone = ZoneContext::new("example.com", None).unwrap();

        let result = registry
            .create_provider(&ProviderConfig::cloudflare_token("token"), zone)
            .await;

        assert!(matches!(result, Err(Error::ZoneNotFound { .. })));
    }

    #[tokio::test]
    async fn creates_registered_node_source() {
        let registry = ProviderRegistry::new();
        crate::source::register(&registry);
        assert!(registry.has_node_source("static"));

        let source = registry
            .create_node_source(&NodeSourceConfig::Static {
                addresses: vec!["1.2.3.4".to_string()],
            })
            .unwrap();
        assert_eq!(source.discover().await.unwrap().len(), 1);
    }
}
