//! Static node source
//!
//! Returns the same fixed live set on every discovery call. Useful for
//! pinning a seed record to known nodes and for tests.

use crate::config::NodeSourceConfig;
use crate::error::{Error, Result};
use crate::node::NodeSet;
use crate::registry::ProviderRegistry;
use crate::traits::{NodeSource, NodeSourceFactory};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};

/// Node source backed by a fixed address list
#[derive(Debug, Clone, Default)]
pub struct StaticNodeSource {
    nodes: NodeSet,
}

impl StaticNodeSource {
    pub fn new(nodes: NodeSet) -> Self {
        Self { nodes }
    }

    /// Parse IPv4 literals into a static source
    ///
    /// Only A records are published, so anything else is rejected here
    /// rather than failing to publish on every pass.
    pub fn parse<S: AsRef<str>>(addresses: &[S]) -> Result<Self> {
        let addresses = addresses
            .iter()
            .map(|a| {
                let a = a.as_ref().trim();
                a.parse::<Ipv4Addr>().map(IpAddr::V4).map_err(|_| {
                    Error::invalid_input(format!("Not an IPv4 literal: '{}'", a))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(NodeSet::from_addresses(addresses)))
    }
}

#[async_trait]
impl NodeSource for StaticNodeSource {
    async fn discover(&self) -> Result<NodeSet> {
        Ok(self.nodes.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// Factory for creating static node sources
pub struct StaticFactory;

impl NodeSourceFactory for StaticFactory {
    fn create(&self, config: &NodeSourceConfig) -> Result<Box<dyn NodeSource>> {
        match config {
            NodeSourceConfig::Static { addresses } => {
                Ok(Box::new(StaticNodeSource::parse(addresses)?))
            }
            _ => Err(Error::config("Invalid config for static node source")),
        }
    }
}

/// Register the static node source with a registry
pub fn register(registry: &ProviderRegistry) {
    registry.register_node_source("static", Box::new(StaticFactory));
}
