// # seedsyncd - DNS seed record daemon
//
// This daemon is a THIN integration layer:
// - Reading configuration from environment variables
// - Initializing logging and the runtime
// - Registering providers and node sources
// - Running the reconciler
//
// Diffing, retry and DNS logic all live in seedsync-core and the provider
// crates.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Zone
// - `SEEDSYNC_DOMAIN`: Zone apex (e.g., example.com)
// - `SEEDSYNC_SUBDOMAIN`: Label under the apex (optional, e.g., node)
//
// ### DNS Provider
// - `SEEDSYNC_PROVIDER_TYPE`: Provider type (cloudflare)
// - `SEEDSYNC_CLOUDFLARE_API_TOKEN`: API token
// - `SEEDSYNC_CLOUDFLARE_API_EMAIL` + `SEEDSYNC_CLOUDFLARE_API_KEY`: legacy
//   global key auth, instead of a token
// - `SEEDSYNC_RECORD_TTL`: TTL of created records (default 120)
//
// ### Node Source
// - `SEEDSYNC_SOURCE_TYPE`: Node source type (monero_rpc, static)
// - `SEEDSYNC_RPC_URL`: Daemon RPC URL (for monero_rpc)
// - `SEEDSYNC_RPC_INCLUDE_GRAY`: Also publish gray-list peers (default false)
// - `SEEDSYNC_STATIC_NODES`: Comma-separated addresses (for static)
//
// ### Reconciler
// - `SEEDSYNC_PASS_INTERVAL_SECS`: Seconds between passes (default 300)
// - `SEEDSYNC_MAX_RETRIES`: Retries of a failed record listing (default 5)
// - `SEEDSYNC_RETRY_DELAY_MS`: Delay between listing attempts (default 1000)
// - `SEEDSYNC_MAX_RECORDS`: Cap on published records (optional)
// - `SEEDSYNC_ONESHOT`: Run a single pass and exit (default false)
//
// ## Example
//
// ```bash
// export SEEDSYNC_DOMAIN=example.com
// export SEEDSYNC_SUBDOMAIN=node
// export SEEDSYNC_CLOUDFLARE_API_TOKEN=your_token
// export SEEDSYNC_RPC_URL=http://127.0.0.1:18081
//
// seedsyncd
// ```

use anyhow::{Context, Result};
use seedsync_core::{
    NodeSourceConfig, ProviderConfig, ProviderRegistry, Reconciler, ReconcilerConfig,
    ReconcilerEvent, SeedConfig, ZoneConfig,
};
use std::env;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown (or a successful one-shot pass)
/// - 1: Configuration or startup error, including an unknown zone
/// - 2: Runtime error (or a failed one-shot pass)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeedExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<SeedExitCode> for ExitCode {
    fn from(code: SeedExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
struct Config {
    seed: SeedConfig,
    oneshot: bool,
    log_level: String,
}

/// Read an optional variable; empty counts as unset
fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read an optional variable and parse it
fn parsed<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| anyhow::anyhow!("{} has invalid value '{}': {}", name, v, e))
        })
        .transpose()
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let zone = ZoneConfig::new(
            var("SEEDSYNC_DOMAIN").context("SEEDSYNC_DOMAIN is required")?,
            var("SEEDSYNC_SUBDOMAIN"),
        );

        let provider_type =
            var("SEEDSYNC_PROVIDER_TYPE").unwrap_or_else(|| "cloudflare".to_string());
        let provider = match provider_type.as_str() {
            "cloudflare" => {
                let mut provider = ProviderConfig::Cloudflare {
                    api_token: var("SEEDSYNC_CLOUDFLARE_API_TOKEN"),
                    api_email: var("SEEDSYNC_CLOUDFLARE_API_EMAIL"),
                    api_key: var("SEEDSYNC_CLOUDFLARE_API_KEY"),
                    api_base: var("SEEDSYNC_CLOUDFLARE_API_BASE"),
                    ttl: seedsync_core::traits::DEFAULT_RECORD_TTL,
                    timeout_secs: 30,
                    user_agent: None,
                };
                if let Some(record_ttl) = parsed::<u32>("SEEDSYNC_RECORD_TTL")?
                    && let ProviderConfig::Cloudflare { ttl, .. } = &mut provider
                {
                    *ttl = record_ttl;
                }
                provider
            }
            other => anyhow::bail!(
                "SEEDSYNC_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: cloudflare",
                other
            ),
        };

        let source_type = var("SEEDSYNC_SOURCE_TYPE").unwrap_or_else(|| "monero_rpc".to_string());
        let source = match source_type.as_str() {
            "monero_rpc" => NodeSourceConfig::MoneroRpc {
                url: var("SEEDSYNC_RPC_URL")
                    .context("SEEDSYNC_RPC_URL is required when SEEDSYNC_SOURCE_TYPE=monero_rpc")?,
                timeout_secs: 10,
                require_rpc_port: true,
                include_gray: parsed("SEEDSYNC_RPC_INCLUDE_GRAY")?.unwrap_or(false),
            },
            "static" => NodeSourceConfig::Static {
                addresses: var("SEEDSYNC_STATIC_NODES")
                    .unwrap_or_default()
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            other => anyhow::bail!(
                "SEEDSYNC_SOURCE_TYPE '{}' is not supported. \
                Supported types: monero_rpc, static",
                other
            ),
        };

        let defaults = ReconcilerConfig::default();
        let reconciler = ReconcilerConfig {
            max_fetch_retries: parsed("SEEDSYNC_MAX_RETRIES")?
                .unwrap_or(defaults.max_fetch_retries),
            fetch_retry_delay_ms: parsed("SEEDSYNC_RETRY_DELAY_MS")?
                .unwrap_or(defaults.fetch_retry_delay_ms),
            pass_interval_secs: parsed("SEEDSYNC_PASS_INTERVAL_SECS")?
                .unwrap_or(defaults.pass_interval_secs),
            event_channel_capacity: defaults.event_channel_capacity,
            max_records: parsed("SEEDSYNC_MAX_RECORDS")?,
        };

        Ok(Self {
            seed: SeedConfig {
                zone,
                provider,
                source,
                reconciler,
            },
            oneshot: parsed("SEEDSYNC_ONESHOT")?.unwrap_or(false),
            log_level: var("SEEDSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// Checks the seed configuration plus the daemon-only settings.
    fn validate(&self) -> Result<()> {
        self.seed.validate()?;

        if let NodeSourceConfig::Static { addresses } = &self.seed.source
            && addresses.is_empty()
        {
            anyhow::bail!(
                "SEEDSYNC_STATIC_NODES must contain at least one address \
                when SEEDSYNC_SOURCE_TYPE=static"
            );
        }

        if self.seed.reconciler.max_fetch_retries > 20 {
            anyhow::bail!(
                "SEEDSYNC_MAX_RETRIES must be between 0 and 20. Got: {}",
                self.seed.reconciler.max_fetch_retries
            );
        }

        if !(10..=86400).contains(&self.seed.reconciler.pass_interval_secs) {
            anyhow::bail!(
                "SEEDSYNC_PASS_INTERVAL_SECS must be between 10 and 86400 seconds. Got: {}",
                self.seed.reconciler.pass_interval_secs
            );
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "SEEDSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return SeedExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return SeedExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SeedExitCode::ConfigError.into();
    }

    info!("Starting seedsyncd {}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SeedExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Log reconciler events until the reconciler drops its sender
fn drain_events(mut events: mpsc::Receiver<ReconcilerEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Reconciler event: {:?}", event);
        }
    })
}

/// Build the registry with every compiled-in plugin
fn registry() -> ProviderRegistry {
    let registry = ProviderRegistry::new();
    seedsync_core::source::register(&registry);

    #[cfg(feature = "cloudflare")]
    seedsync_provider_cloudflare::register(&registry);

    #[cfg(feature = "rpc")]
    seedsync_rpc::register(&registry);

    info!(
        "Registered providers: {:?}; node sources: {:?}",
        registry.list_providers(),
        registry.list_node_sources()
    );
    registry
}

/// Run the daemon
async fn run_daemon(config: Config) -> SeedExitCode {
    let registry = registry();
    let seed = config.seed;

    let zone = match seed.zone.to_context() {
        Ok(zone) => zone,
        Err(e) => {
            error!("Invalid zone: {}", e);
            return SeedExitCode::ConfigError;
        }
    };

    let source = match registry.create_node_source(&seed.source) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to create node source: {}", e);
            return SeedExitCode::ConfigError;
        }
    };

    let provider = match registry.create_provider(&seed.provider, zone).await {
        Ok(provider) => provider,
        Err(e) if e.is_fatal() => {
            error!("Failed to create DNS provider: {}", e);
            return SeedExitCode::ConfigError;
        }
        Err(e) => {
            error!("Failed to create DNS provider: {}", e);
            return SeedExitCode::RuntimeError;
        }
    };

    info!(
        "Managing {} via {} from {}",
        provider.zone().fulldomain_name(),
        provider.provider_name(),
        source.source_name()
    );

    let (reconciler, events) = match Reconciler::new(source, provider, seed.reconciler) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Failed to create reconciler: {}", e);
            return SeedExitCode::ConfigError;
        }
    };
    drain_events(events);

    if config.oneshot {
        let outcome = reconciler.run_pass().await;
        return if outcome.is_success() {
            SeedExitCode::CleanShutdown
        } else {
            error!("Reconciliation pass did not succeed");
            SeedExitCode::RuntimeError
        };
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown signal error: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    match reconciler.run_with_shutdown(Some(shutdown_rx)).await {
        Ok(()) => {
            info!("Shutting down daemon");
            SeedExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Reconciler error: {}", e);
            SeedExitCode::RuntimeError
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(source: NodeSourceConfig) -> Config {
        Config {
            seed: SeedConfig {
                zone: ZoneConfig::new("example.com", Some("node".to_string())),
                provider: ProviderConfig::cloudflare_token("token"),
                source,
                reconciler: ReconcilerConfig::default(),
            },
            oneshot: false,
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn static_source_needs_addresses() {
        let cfg = config(NodeSourceConfig::Static { addresses: vec![] });
        assert!(cfg.validate().is_err());

        let cfg = config(NodeSourceConfig::Static {
            addresses: vec!["1.2.3.4".to_string()],
        });
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn pass_interval_range() {
        let mut cfg = config(NodeSourceConfig::Static {
            addresses: vec!["1.2.3.4".to_string()],
        });
        cfg.seed.reconciler.pass_interval_secs = 5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn log_level_parsing() {
        let mut cfg = config(NodeSourceConfig::Static {
            addresses: vec!["1.2.3.4".to_string()],
        });
        cfg.log_level = "DEBUG".to_string();
        assert_eq!(cfg.level().unwrap(), Level::DEBUG);

        cfg.log_level = "verbose".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn registry_has_builtin_plugins() {
        let registry = registry();
        assert!(registry.has_node_source("static"));
        #[cfg(feature = "cloudflare")]
        assert!(registry.has_provider("cloudflare"));
        #[cfg(feature = "rpc")]
        assert!(registry.has_node_source("monero_rpc"));
    }

    #[tokio::test]
    async fn events_are_drained_past_channel_capacity() {
        let (tx, rx) = mpsc::channel(1);
        let drain = drain_events(rx);

        for _ in 0..10 {
            tx.send(ReconcilerEvent::PassStarted).await.unwrap();
        }
        drop(tx);

        tokio::time::timeout(std::time::Duration::from_secs(1), drain)
            .await
            .expect("drain ends when the sender is dropped")
            .unwrap();
    }

    #[test]
    fn exit_code_values() {
        assert_eq!(SeedExitCode::CleanShutdown as u8, 0);
        assert_eq!(SeedExitCode::ConfigError as u8, 1);
        assert_eq!(SeedExitCode::RuntimeError as u8, 2);
    }
}
