// # Monero RPC Node Source
//
// This crate discovers live seed nodes from a Monero daemon's peer list.
//
// ## Behaviour
//
// - One `POST {url}/get_peer_list` per discovery call, no caching
// - Reads `white_list` (peers the daemon has connected to) and, when
//   configured, `gray_list`
// - Keeps IPv4 peers only; the seed record is a set of A records
// - By default keeps only peers advertising a public RPC port
// - NO retry logic: a failed discovery aborts the pass and the next
//   pass tries again
//
// ## Response Shape
//
// ```json
// {
//   "status": "OK",
//   "white_list": [
//     { "host": "1.2.3.4", "id": 1234, "ip": 67305985, "port": 18080, "rpc_port": 18089, "last_seen": 1700000000 }
//   ],
//   "gray_list": []
// }
// ```

use async_trait::async_trait;
use seedsync_core::ProviderRegistry;
use seedsync_core::config::NodeSourceConfig;
use seedsync_core::traits::{NodeSource, NodeSourceFactory};
use seedsync_core::{Error, Node, NodeSet, Result};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tracing::{debug, info};

/// Default per-request timeout for daemon RPC calls
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct PeerListResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    white_list: Vec<Peer>,
    #[serde(default)]
    gray_list: Vec<Peer>,
}

#[derive(Debug, Deserialize)]
struct Peer {
    #[serde(default)]
    host: String,
    #[serde(default)]
    rpc_port: Option<u16>,
}

/// Live-node source backed by `monerod`'s `get_peer_list`
#[derive(Debug, Clone)]
pub struct MoneroRpcSource {
    url: String,
    require_rpc_port: bool,
    include_gray: bool,
    client: reqwest::Client,
}

impl MoneroRpcSource {
    /// Create a source for the daemon at `url` (e.g. "http://127.0.0.1:18081")
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into().trim_end_matches('/').to_string(),
            require_rpc_port: true,
            include_gray: false,
            client,
        })
    }

    /// Keep peers that advertise no RPC port
    pub fn with_require_rpc_port(mut self, require_rpc_port: bool) -> Self {
        self.require_rpc_port = require_rpc_port;
        self
    }

    pub fn with_gray_list(mut self, include_gray: bool) -> Self {
        self.include_gray = include_gray;
        self
    }

    async fn fetch_peer_list(&self) -> Result<PeerListResponse> {
        let url = format!("{}/get_peer_list", self.url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Error::rpc(format!("get_peer_list request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::rpc(format!(
                "get_peer_list returned HTTP {}",
                response.status()
            )));
        }

        let peers: PeerListResponse = response
            .json()
            .await
            .map_err(|e| Error::rpc(format!("get_peer_list response unreadable: {}", e)))?;

        match peers.status.as_deref() {
            None | Some("OK") => Ok(peers),
            Some(status) => Err(Error::rpc(format!(
                "get_peer_list returned status '{}'",
                status
            ))),
        }
    }

    /// Turn a peer list into the live set
    fn live_nodes(&self, response: PeerListResponse) -> NodeSet {
        let gray = if self.include_gray {
            response.gray_list
        } else {
            Vec::new()
        };

        let mut nodes = NodeSet::new();
        for peer in response.white_list.into_iter().chain(gray) {
            let Ok(address) = peer.host.parse::<Ipv4Addr>() else {
                debug!("Skipping peer '{}': not an IPv4 address", peer.host);
                continue;
            };

            if self.require_rpc_port && peer.rpc_port.unwrap_or(0) == 0 {
                debug!("Skipping peer {}: no public RPC port", address);
                continue;
            }

            let address = IpAddr::V4(address);
            if !nodes.contains_address(&address) {
                nodes.push(Node::live(address));
            }
        }

        nodes
    }
}

#[async_trait]
impl NodeSource for MoneroRpcSource {
    async fn discover(&self) -> Result<NodeSet> {
        let response = self.fetch_peer_list().await?;
        let offered = response.white_list.len() + response.gray_list.len();
        let nodes = self.live_nodes(response);

        info!(
            "Discovered {} live nodes from {} peers at {}",
            nodes.len(),
            offered,
            self.url
        );
        Ok(nodes)
    }

    fn source_name(&self) -> &'static str {
        "monero_rpc"
    }
}

/// Factory for creating Monero RPC node sources
pub struct MoneroRpcFactory;

impl NodeSourceFactory for MoneroRpcFactory {
    fn create(&self, config: &NodeSourceConfig) -> Result<Box<dyn NodeSource>> {
        match config {
            NodeSourceConfig::MoneroRpc {
                url,
                timeout_secs,
                require_rpc_port,
                include_gray,
            } => {
                let source = MoneroRpcSource::new(url.clone(), Duration::from_secs(*timeout_secs))?
                    .with_require_rpc_port(*require_rpc_port)
                    .with_gray_list(*include_gray);
                Ok(Box::new(source))
            }
            _ => Err(Error::config("Invalid config for Monero RPC node source")),
        }
    }
}

/// Register the Monero RPC node source with a registry
pub fn register(registry: &ProviderRegistry) {
    registry.register_node_source("monero_rpc", Box::new(MoneroRpcFactory));
}
