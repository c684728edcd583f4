// # DNS Provider Trait
//
// Defines the interface for publishing nodes as address records via a
// provider API.
//
// ## Implementations
//
// - Cloudflare: `seedsync-provider-cloudflare` crate
// - Future: Route53, DigitalOcean, etc.
//
// ## Usage
//
// ```rust,ignore
// use seedsync_core::{DnsProvider, Node};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let published = provider.get_records().await?;
//     for node in &published {
//         println!("A {} {}", provider.zone().fulldomain_name(), node.address);
//     }
//
//     provider.add_record(&Node::live("1.2.3.4".parse()?)).await?;
//     Ok(())
// }
// ```

use crate::error::{Error, Result};
use crate::node::{Node, NodeSet};
use crate::zone::ZoneContext;
use async_trait::async_trait;

/// Time-to-live for created records, in seconds
///
/// Kept low so that removed nodes drop out of resolver caches quickly.
pub const DEFAULT_RECORD_TTL: u32 = 120;

/// Trait for DNS provider implementations
///
/// A provider is bound to one [`ZoneContext`] and one backend zone
/// identifier, both resolved when the provider is constructed and
/// immutable afterwards.
///
/// # Single-shot calls
///
/// Every method performs one backend call and reports its result. Providers
/// never retry, sleep, or spawn tasks. The bounded retry around
/// [`get_records`](DnsProvider::get_records) is owned by the
/// [`Reconciler`](crate::Reconciler); writes are never retried because an
/// ambiguous failure (a create that timed out after the backend applied it)
/// would risk duplicate records.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up the backend's zone identifier for `domain_name`
    ///
    /// Only an exact, case-sensitive name match counts. When several zones
    /// match, the first one listed wins.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The zone identifier
    /// - `Err(Error::ZoneNotFound)`: No zone has this exact name
    async fn resolve_zone(&self, domain_name: &str) -> Result<String>;

    /// List the published address records for the zone's full domain name
    ///
    /// Records of other types or names that the backend returns anyway are
    /// filtered out. Duplicates are passed through untouched.
    ///
    /// # Returns
    ///
    /// - `Ok(NodeSet)`: Published nodes, each carrying its record `uid`
    /// - `Err(Error)`: If the listing failed (the caller decides on retry)
    async fn get_records(&self) -> Result<NodeSet>;

    /// Create an address record for the full domain name pointing at `node`
    ///
    /// Pre-existing records are not checked; the reconciler's diff is
    /// responsible for never asking twice.
    async fn add_record(&self, node: &Node) -> Result<()>;

    /// Remove the record identified by `node.uid`
    ///
    /// `node` must come from [`get_records`](DnsProvider::get_records).
    /// A backend response that does not explicitly report success is an
    /// error.
    async fn delete_record(&self, node: &Node) -> Result<()>;

    /// The zone this provider manages
    fn zone(&self) -> &ZoneContext;

    /// Get the provider name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the provider (e.g., "cloudflare")
    fn provider_name(&self) -> &'static str;
}

/// Record identifier of a node that is about to be deleted
///
/// Live nodes carry no identifier and can never be deleted.
pub fn record_uid(node: &Node) -> Result<&str> {
    node.uid.as_deref().ok_or_else(|| {
        Error::invalid_input(format!(
            "Cannot delete record for {}: node has no record identifier",
            node.address
        ))
    })
}

/// Helper trait for constructing DNS providers from configuration
///
/// Construction is async because it resolves the backend zone identifier.
#[async_trait]
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance bound to `zone`
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: A provider with its zone resolved
    /// - `Err(Error::ZoneNotFound)`: The configured domain is not a zone
    ///   visible to these credentials
    async fn create(
        &self,
        config: &crate::config::ProviderConfig,
        zone: ZoneContext,
    ) -> Result<Box<dyn DnsProvider>>;
}
