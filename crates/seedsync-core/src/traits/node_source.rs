// # Node Source Trait
//
// Defines the interface for discovering the live peer set.
//
// ## Implementations
//
// - Monero daemon RPC: `seedsync-rpc` crate
// - Fixed list: [`StaticNodeSource`](crate::source::StaticNodeSource)

use crate::error::Result;
use crate::node::NodeSet;
use async_trait::async_trait;

/// Trait for live-node discovery
///
/// A source reports the addresses that are currently reachable. It does not
/// health-check beyond what its backend already reports, and it never
/// touches DNS.
#[async_trait]
pub trait NodeSource: Send + Sync {
    /// Discover the current live set
    ///
    /// Returned nodes carry no record identifier.
    ///
    /// # Returns
    ///
    /// - `Ok(NodeSet)`: Live nodes in discovery order
    /// - `Err(Error)`: Discovery failed; the reconciler skips the pass
    async fn discover(&self) -> Result<NodeSet>;

    /// Name of this source (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing node sources from configuration
pub trait NodeSourceFactory: Send + Sync {
    /// Create a NodeSource instance from configuration
    fn create(
        &self,
        config: &crate::config::NodeSourceConfig,
    ) -> Result<Box<dyn NodeSource>>;
}
