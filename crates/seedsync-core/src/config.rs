//! Configuration types for the seedsync system
//!
//! This module defines all configuration structures used throughout the workspace.

use crate::zone::ZoneContext;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Main seedsync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Which record set to manage
    pub zone: ZoneConfig,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Live-node source configuration
    pub source: NodeSourceConfig,

    /// Optional reconciler settings
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
}

impl SeedConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.zone.to_context()?;
        self.provider.validate()?;
        self.source.validate()?;
        self.reconciler.validate()?;
        Ok(())
    }
}

/// Zone configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Zone apex (e.g., "example.com")
    pub domain_name: String,

    /// Label under the apex (e.g., "node"); absent means the apex itself
    #[serde(default)]
    pub subdomain_name: Option<String>,
}

impl ZoneConfig {
    /// Create a new zone configuration
    pub fn new(domain_name: impl Into<String>, subdomain_name: Option<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            subdomain_name,
        }
    }

    /// Build the immutable zone context
    pub fn to_context(&self) -> Result<ZoneContext, crate::Error> {
        ZoneContext::new(self.domain_name.clone(), self.subdomain_name.as_deref())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// API token (bearer auth)
        #[serde(default)]
        api_token: Option<String>,
        /// Account email (legacy global key auth)
        #[serde(default)]
        api_email: Option<String>,
        /// Global API key (legacy global key auth)
        #[serde(default)]
        api_key: Option<String>,
        /// API base URL override
        #[serde(default)]
        api_base: Option<String>,
        /// TTL for created records, in seconds
        #[serde(default = "default_record_ttl")]
        ttl: u32,
        /// Per-request timeout, in seconds
        #[serde(default = "default_provider_timeout_secs")]
        timeout_secs: u64,
        /// User-Agent override
        #[serde(default)]
        user_agent: Option<String>,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Cloudflare configuration using an API token and default settings
    pub fn cloudflare_token(api_token: impl Into<String>) -> Self {
        ProviderConfig::Cloudflare {
            api_token: Some(api_token.into()),
            api_email: None,
            api_key: None,
            api_base: None,
            ttl: default_record_ttl(),
            timeout_secs: default_provider_timeout_secs(),
            user_agent: None,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare {
                api_token,
                api_email,
                api_key,
                ttl,
                timeout_secs,
                ..
            } => {
                let has_token = api_token.as_ref().is_some_and(|t| !t.is_empty());
                let has_email = api_email.as_ref().is_some_and(|e| !e.is_empty());
                let has_key = api_key.as_ref().is_some_and(|k| !k.is_empty());

                match (has_token, has_email, has_key) {
                    (true, false, false) | (false, true, true) => {}
                    (false, false, false) => {
                        return Err(crate::Error::config(
                            "Cloudflare credentials missing: set an API token, or an API email and key",
                        ));
                    }
                    (false, _, _) => {
                        return Err(crate::Error::config(
                            "Cloudflare API email and API key must be set together",
                        ));
                    }
                    (true, _, _) => {
                        return Err(crate::Error::config(
                            "Cloudflare API token cannot be combined with API email/key",
                        ));
                    }
                }

                // 1 means "automatic" on Cloudflare
                if *ttl != 1 && !(60..=86400).contains(ttl) {
                    return Err(crate::Error::config(format!(
                        "Record TTL must be 1 (automatic) or between 60 and 86400 seconds. Got: {}",
                        ttl
                    )));
                }

                if *timeout_secs == 0 {
                    return Err(crate::Error::config("Provider timeout must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

// Credentials never reach Debug output
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Cloudflare {
                api_token,
                api_email,
                api_key,
                api_base,
                ttl,
                timeout_secs,
                user_agent,
            } => f
                .debug_struct("Cloudflare")
                .field("api_token", &api_token.as_ref().map(|_| "<REDACTED>"))
                .field("api_email", api_email)
                .field("api_key", &api_key.as_ref().map(|_| "<REDACTED>"))
                .field("api_base", api_base)
                .field("ttl", ttl)
                .field("timeout_secs", timeout_secs)
                .field("user_agent", user_agent)
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .finish_non_exhaustive(),
        }
    }
}

/// Live-node source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeSourceConfig {
    /// Monero daemon RPC (`get_peer_list`)
    MoneroRpc {
        /// Daemon RPC base URL (e.g., "http://127.0.0.1:18081")
        url: String,
        /// Per-request timeout, in seconds
        #[serde(default = "default_rpc_timeout_secs")]
        timeout_secs: u64,
        /// Only publish peers that advertise a public RPC port
        #[serde(default = "default_true")]
        require_rpc_port: bool,
        /// Also consider the gray list (peers never connected to)
        #[serde(default)]
        include_gray: bool,
    },

    /// Fixed address list
    Static {
        /// IP address literals
        addresses: Vec<String>,
    },

    /// Custom node source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl NodeSourceConfig {
    /// Validate the node source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            NodeSourceConfig::MoneroRpc {
                url, timeout_secs, ..
            } => {
                if url.is_empty() {
                    return Err(crate::Error::config("RPC URL cannot be empty"));
                }
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(crate::Error::config(format!(
                        "RPC URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("RPC timeout must be > 0"));
                }
                Ok(())
            }
            NodeSourceConfig::Static { addresses } => {
                // Only A records are managed
                for address in addresses {
                    address.trim().parse::<Ipv4Addr>().map_err(|_| {
                        crate::Error::config(format!(
                            "Static node address is not an IPv4 literal: '{}'",
                            address
                        ))
                    })?;
                }
                Ok(())
            }
            NodeSourceConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom node source factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom node source config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the node source type name
    pub fn type_name(&self) -> &str {
        match self {
            NodeSourceConfig::MoneroRpc { .. } => "monero_rpc",
            NodeSourceConfig::Static { .. } => "static",
            NodeSourceConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Reconciler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Retries after a failed record listing (total attempts = retries + 1)
    #[serde(default = "default_max_fetch_retries")]
    pub max_fetch_retries: usize,

    /// Fixed delay between listing attempts (in milliseconds)
    #[serde(default = "default_fetch_retry_delay_ms")]
    pub fetch_retry_delay_ms: u64,

    /// Interval between reconciliation passes (in seconds)
    #[serde(default = "default_pass_interval_secs")]
    pub pass_interval_secs: u64,

    /// Capacity of the internal event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Upper bound on the number of published records
    ///
    /// The live set is truncated to its first `max_records` nodes before
    /// diffing. `None` publishes every live node.
    #[serde(default)]
    pub max_records: Option<usize>,
}

impl ReconcilerConfig {
    /// Validate the reconciler configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.pass_interval_secs == 0 {
            return Err(crate::Error::config("Pass interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        if self.max_records == Some(0) {
            return Err(crate::Error::config(
                "max_records must be > 0 (omit it to publish every live node)",
            ));
        }
        Ok(())
    }

    /// Delay between listing attempts
    pub fn fetch_retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.fetch_retry_delay_ms)
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_fetch_retries: default_max_fetch_retries(),
            fetch_retry_delay_ms: default_fetch_retry_delay_ms(),
            pass_interval_secs: default_pass_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
            max_records: None,
        }
    }
}

fn default_record_ttl() -> u32 {
    crate::traits::DEFAULT_RECORD_TTL
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_max_fetch_retries() -> usize {
    5
}

fn default_fetch_retry_delay_ms() -> u64 {
    1000
}

fn default_pass_interval_secs() -> u64 {
    300
}

fn default_event_channel_capacity() -> usize {
    1000
}
