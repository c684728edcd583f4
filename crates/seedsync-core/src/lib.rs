// # seedsync-core
//
// Core library keeping a DNS seed record in sync with a live peer set.
//
// ## Architecture Overview
//
// - **Node / NodeSet**: Addresses, live or published, keyed by address
// - **ZoneContext**: The record name a provider manages
// - **NodeSource**: Trait for discovering the live peer set
// - **DnsProvider**: Trait for listing, creating and deleting address records
// - **Reconciler**: Diffs live against published and applies the mutations
// - **ProviderRegistry**: Plugin-based registry for providers and sources
//
// ## Design Principles
//
// 1. **Provider-agnostic**: The reconciler only sees the `DnsProvider` trait
// 2. **Read retry only**: Listing is retried with a bounded budget, writes never are
// 3. **Unknown is not empty**: No mutation happens against an unknown baseline
// 4. **Idempotent passes**: A second pass with an unchanged live set is a no-op

pub mod config;
pub mod error;
pub mod node;
pub mod reconciler;
pub mod registry;
pub mod source;
pub mod traits;
pub mod zone;

// Re-export core types for convenience
pub use config::{NodeSourceConfig, ProviderConfig, ReconcilerConfig, SeedConfig, ZoneConfig};
pub use error::{Error, Result};
pub use node::{Node, NodeSet};
pub use reconciler::{
    AbortReason, Diff, MutationKind, MutationOutcome, PassOutcome, PassReport, Reconciler,
    ReconcilerEvent,
};
pub use registry::ProviderRegistry;
pub use source::StaticNodeSource;
pub use traits::{DnsProvider, NodeSource};
pub use zone::ZoneContext;
