// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for seedsync.
//
// ## Behaviour
//
// - Resolves the zone identifier once, at construction, by listing every
//   zone visible to the credentials and matching the domain exactly
// - Lists, creates and deletes A records for one fully-qualified name
// - One HTTP request per operation (plus pagination on list endpoints)
// - HTTP timeout configured (30 seconds by default)
// - NO retry logic (the read retry is owned by the Reconciler)
// - NO caching of records between calls
//
// ## Security Requirements
//
// - Credentials NEVER appear in logs or Debug output
// - Credentials are bound into the HTTP client's default headers at
//   construction and never mutated afterwards
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=A&name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

mod client;
mod models;

pub use client::{CloudflareAuth, find_zone_id};
pub use models::Zone;

use async_trait::async_trait;
use client::Transport;
use models::{CreateRecord, DeletedRecord, DnsRecord};
use reqwest::Method;
use seedsync_core::config::ProviderConfig;
use seedsync_core::traits::{DEFAULT_RECORD_TTL, DnsProvider, DnsProviderFactory, record_uid};
use seedsync_core::{Error, Node, NodeSet, ProviderRegistry, Result, ZoneContext};
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// The only record type this provider manages
const RECORD_TYPE: &str = "A";

/// Connection settings for [`CloudflareProvider`]
#[derive(Debug, Clone)]
pub struct CloudflareSettings {
    pub auth: CloudflareAuth,
    pub api_base: String,
    /// TTL for created records, in seconds
    pub ttl: u32,
    pub timeout: Duration,
    pub user_agent: String,
}

impl CloudflareSettings {
    /// Settings with production defaults
    pub fn new(auth: CloudflareAuth) -> Self {
        Self {
            auth,
            api_base: CLOUDFLARE_API_BASE.to_string(),
            ttl: DEFAULT_RECORD_TTL,
            timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: default_user_agent(),
        }
    }

    /// Point the provider at another API base (e.g. a mock server)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build settings from a validated provider configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        match config {
            ProviderConfig::Cloudflare {
                api_token,
                api_email,
                api_key,
                api_base,
                ttl,
                timeout_secs,
                user_agent,
            } => {
                let auth = match (api_token, api_email, api_key) {
                    (Some(token), _, _) if !token.is_empty() => {
                        CloudflareAuth::Token(token.clone())
                    }
                    (_, Some(email), Some(key)) => CloudflareAuth::GlobalKey {
                        email: email.clone(),
                        key: key.clone(),
                    },
                    _ => return Err(Error::config("Cloudflare credentials missing")),
                };

                let mut settings = Self::new(auth)
                    .with_ttl(*ttl)
                    .with_timeout(Duration::from_secs(*timeout_secs));
                if let Some(api_base) = api_base {
                    settings = settings.with_api_base(api_base.clone());
                }
                if let Some(user_agent) = user_agent {
                    settings.user_agent = user_agent.clone();
                }
                Ok(settings)
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

fn default_user_agent() -> String {
    format!("seedsync/{}", env!("CARGO_PKG_VERSION"))
}

/// Cloudflare DNS provider
///
/// Bound to one zone for its whole lifetime: the zone context and the
/// Cloudflare zone identifier are resolved in [`CloudflareProvider::connect`]
/// and never change.
pub struct CloudflareProvider {
    transport: Transport,
    zone: ZoneContext,
    zone_id: String,
    ttl: u32,
}

// Custom Debug implementation that hides the HTTP client and its credential headers
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("zone", &self.zone)
            .field("zone_id", &self.zone_id)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CloudflareProvider {
    /// Create a provider and resolve its zone identifier
    ///
    /// # Returns
    ///
    /// - `Ok(CloudflareProvider)`: Ready to use
    /// - `Err(Error::ZoneNotFound)`: No zone named exactly
    ///   `zone.domain_name()` is visible to these credentials
    /// - `Err(Error)`: Zone listing failed (transport, auth, ...)
    pub async fn connect(settings: CloudflareSettings, zone: ZoneContext) -> Result<Self> {
        let transport = Transport::new(
            &settings.api_base,
            &settings.auth,
            &settings.user_agent,
            settings.timeout,
        )?;

        let zone_id = resolve_zone_id(&transport, zone.domain_name()).await?;
        info!(
            "Cloudflare zone_id '{}' matched to '{}'",
            zone_id,
            zone.domain_name()
        );

        Ok(Self {
            transport,
            zone,
            zone_id,
            ttl: settings.ttl,
        })
    }

    /// The resolved Cloudflare zone identifier
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    fn records_path(&self) -> String {
        format!("/zones/{}/dns_records", self.zone_id)
    }

    /// Turn a record listing into published nodes
    ///
    /// Keeps only A records whose name is exactly the managed name.
    fn published_nodes(&self, records: Vec<DnsRecord>) -> NodeSet {
        let fulldomain = self.zone.fulldomain_name();
        let mut nodes = NodeSet::new();

        for record in records {
            if record.record_type != RECORD_TYPE || record.name != fulldomain {
                debug!(
                    "Ignoring {} record {} returned for {}",
                    record.record_type, record.name, fulldomain
                );
                continue;
            }

            match record.content.parse::<IpAddr>() {
                Ok(address) => nodes.push(Node::published(address, record.id)),
                Err(_) => warn!(
                    "Ignoring A record {} with unparsable content '{}'",
                    record.id, record.content
                ),
            }
        }

        nodes
    }
}

async fn resolve_zone_id(transport: &Transport, domain_name: &str) -> Result<String> {
    info!("Determining zone_id; looking for '{}'", domain_name);

    let zones = transport.list_zones().await?;
    find_zone_id(&zones, domain_name)
        .map(str::to_string)
        .ok_or_else(|| Error::zone_not_found(domain_name))
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn resolve_zone(&self, domain_name: &str) -> Result<String> {
        resolve_zone_id(&self.transport, domain_name).await
    }

    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=node.example.com
    /// ```
    async fn get_records(&self) -> Result<NodeSet> {
        let fulldomain = self.zone.fulldomain_name();
        let records: Vec<DnsRecord> = self
            .transport
            .get_all(
                &self.records_path(),
                &[
                    ("type", RECORD_TYPE.to_string()),
                    ("name", fulldomain.to_string()),
                ],
                "Record listing",
            )
            .await?;

        Ok(self.published_nodes(records))
    }

    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// {"name": "node.example.com", "content": "1.2.3.4", "type": "A", "ttl": 120}
    /// ```
    async fn add_record(&self, node: &Node) -> Result<()> {
        if !node.address.is_ipv4() {
            return Err(Error::invalid_input(format!(
                "{} is not an IPv4 address; only A records are managed",
                node.address
            )));
        }

        let body = CreateRecord {
            name: self.zone.fulldomain_name(),
            content: node.address.to_string(),
            record_type: RECORD_TYPE,
            ttl: self.ttl,
        };

        let _: models::ApiEnvelope<DnsRecord> = self
            .transport
            .request(
                Method::POST,
                &self.records_path(),
                &[],
                Some(&body),
                "Record insertion",
            )
            .await?;

        debug!("Created A {} {}", body.name, body.content);
        Ok(())
    }

    /// ```http
    /// DELETE /zones/:zone_id/dns_records/:record_id
    /// ```
    ///
    /// Succeeds only when the response carries `"success": true`.
    async fn delete_record(&self, node: &Node) -> Result<()> {
        let uid = record_uid(node)?;
        let path = format!("{}/{}", self.records_path(), uid);

        let envelope: models::ApiEnvelope<DeletedRecord> = self
            .transport
            .request::<_, ()>(Method::DELETE, &path, &[], None, "Record deletion")
            .await?;

        if envelope.success != Some(true) {
            return Err(Error::malformed(format!(
                "Record deletion for {} did not report success",
                node.address
            )));
        }

        debug!(
            "Deleted record {}",
            envelope.result.and_then(|r| r.id).as_deref().unwrap_or(uid)
        );
        Ok(())
    }

    fn zone(&self) -> &ZoneContext {
        &self.zone
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

#[async_trait]
impl DnsProviderFactory for CloudflareFactory {
    async fn create(
        &self,
        config: &ProviderConfig,
        zone: ZoneContext,
    ) -> Result<Box<dyn DnsProvider>> {
        let settings = CloudflareSettings::from_config(config)?;
        Ok(Box::new(CloudflareProvider::connect(settings, zone).await?))
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use seedsync_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// seedsync_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider("cloudflare", Box::new(CloudflareFactory));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_from_token_config() {
        let settings =
            CloudflareSettings::from_config(&ProviderConfig::cloudflare_token("secret_token_12345"))
                .unwrap();

        assert!(matches!(settings.auth, CloudflareAuth::Token(_)));
        assert_eq!(settings.api_base, CLOUDFLARE_API_BASE);
        assert_eq!(settings.ttl, 120);
        assert_eq!(settings.timeout, DEFAULT_HTTP_TIMEOUT);
        assert!(settings.user_agent.starts_with("seedsync/"));
        assert!(!format!("{:?}", settings).contains("secret_token_12345"));
    }

    #[test]
    fn settings_from_global_key_config() {
        let config = ProviderConfig::Cloudflare {
            api_token: None,
            api_email: Some("ops@example.com".to_string()),
            api_key: Some("key".to_string()),
            api_base: Some("http://127.0.0.1:9999".to_string()),
            ttl: 300,
            timeout_secs: 5,
            user_agent: Some("custom-agent".to_string()),
        };

        let settings = CloudflareSettings::from_config(&config).unwrap();
        assert!(matches!(settings.auth, CloudflareAuth::GlobalKey { .. }));
        assert_eq!(settings.api_base, "http://127.0.0.1:9999");
        assert_eq!(settings.ttl, 300);
        assert_eq!(settings.timeout, Duration::from_secs(5));
        assert_eq!(settings.user_agent, "custom-agent");
    }

    #[test]
    fn settings_reject_missing_credentials() {
        let config = ProviderConfig::Cloudflare {
            api_token: None,
            api_email: None,
            api_key: None,
            api_base: None,
            ttl: 120,
            timeout_secs: 30,
            user_agent: None,
        };
        assert!(matches!(
            CloudflareSettings::from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_register() {
        let registry = ProviderRegistry::new();
        register(&registry);
        assert!(registry.has_provider("cloudflare"));
    }
}
