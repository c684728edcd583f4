//! Core traits for the seedsync system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`NodeSource`]: Discover the live peer set
//! - [`DnsProvider`]: Read and mutate published address records

pub mod dns_provider;
pub mod node_source;

pub use dns_provider::{DEFAULT_RECORD_TTL, DnsProvider, DnsProviderFactory, record_uid};
pub use node_source::{NodeSource, NodeSourceFactory};
