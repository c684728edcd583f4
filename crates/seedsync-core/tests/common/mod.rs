//! Test doubles and common utilities for reconciler contract tests
//!
//! The mock provider keeps an in-memory zone so that mutations take effect
//! and a following pass sees them, like a real backend would.

#![allow(dead_code)]

use seedsync_core::error::{Error, Result};
use seedsync_core::{DnsProvider, Node, NodeSet, NodeSource, ReconcilerConfig, ZoneContext};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid IP literal")
}

pub fn zone() -> ZoneContext {
    ZoneContext::new("example.com", Some("node")).expect("valid zone")
}

/// Reconciler settings with no delay between listing attempts
pub fn fast_config() -> ReconcilerConfig {
    ReconcilerConfig {
        max_fetch_retries: 5,
        fetch_retry_delay_ms: 0,
        pass_interval_secs: 3600,
        event_channel_capacity: 100,
        max_records: None,
    }
}

#[derive(Default)]
struct MockZoneState {
    records: Mutex<Vec<Node>>,
    next_id: AtomicUsize,
    get_calls: AtomicUsize,
    add_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    /// Listing calls left to fail; usize::MAX fails forever
    failing_gets: AtomicUsize,
    failing_adds: Mutex<HashSet<IpAddr>>,
    unconfirmed_deletes: Mutex<HashSet<IpAddr>>,
    call_log: Mutex<Vec<String>>,
}

/// A DnsProvider backed by an in-memory zone
///
/// Clones share the same zone and counters, so a test can hand one clone
/// to the reconciler and inspect another.
#[derive(Clone)]
pub struct MockDnsProvider {
    state: Arc<MockZoneState>,
    zone: ZoneContext,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockZoneState::default()),
            zone: zone(),
        }
    }

    /// Pre-populate the zone with `(address, uid)` records
    pub fn with_records(records: &[(&str, &str)]) -> Self {
        let provider = Self::new();
        provider.state.records.lock().unwrap().extend(
            records
                .iter()
                .map(|(address, uid)| Node::published(ip(address), *uid)),
        );
        provider
    }

    /// Fail the next `n` listing calls
    pub fn fail_next_gets(&self, n: usize) {
        self.state.failing_gets.store(n, Ordering::SeqCst);
    }

    /// Fail every listing call
    pub fn fail_all_gets(&self) {
        self.fail_next_gets(usize::MAX);
    }

    /// Fail record creation for `address`
    pub fn fail_adds_for(&self, address: &str) {
        self.state.failing_adds.lock().unwrap().insert(ip(address));
    }

    /// Stop failing record creation for `address`
    pub fn heal_adds_for(&self, address: &str) {
        self.state.failing_adds.lock().unwrap().remove(&ip(address));
    }

    /// Answer deletions for `address` without a success confirmation
    pub fn unconfirm_deletes_for(&self, address: &str) {
        self.state
            .unconfirmed_deletes
            .lock()
            .unwrap()
            .insert(ip(address));
    }

    pub fn published(&self) -> NodeSet {
        self.state.records.lock().unwrap().iter().cloned().collect()
    }

    /// Published addresses, sorted
    pub fn published_addresses(&self) -> Vec<IpAddr> {
        let mut addresses: Vec<_> = self.published().addresses().collect();
        addresses.sort();
        addresses
    }

    pub fn get_calls(&self) -> usize {
        self.state.get_calls.load(Ordering::SeqCst)
    }

    pub fn add_calls(&self) -> usize {
        self.state.add_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.state.delete_calls.load(Ordering::SeqCst)
    }

    pub fn mutation_calls(&self) -> usize {
        self.add_calls() + self.delete_calls()
    }

    /// Mutations in call order, e.g. `["delete 9.9.9.9", "add 5.6.7.8"]`
    pub fn call_log(&self) -> Vec<String> {
        self.state.call_log.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn resolve_zone(&self, domain_name: &str) -> Result<String> {
        if domain_name == self.zone.domain_name() {
            Ok("mock-zone".to_string())
        } else {
            Err(Error::zone_not_found(domain_name))
        }
    }

    async fn get_records(&self) -> Result<NodeSet> {
        self.state.get_calls.fetch_add(1, Ordering::SeqCst);

        let remaining = self.state.failing_gets.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != usize::MAX {
                self.state.failing_gets.store(remaining - 1, Ordering::SeqCst);
            }
            return Err(Error::http("connection reset by peer"));
        }

        Ok(self.published())
    }

    async fn add_record(&self, node: &Node) -> Result<()> {
        self.state.add_calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .call_log
            .lock()
            .unwrap()
            .push(format!("add {}", node.address));

        if self.state.failing_adds.lock().unwrap().contains(&node.address) {
            return Err(Error::provider("mock", "HTTP 500 Internal Server Error"));
        }

        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst);
        self.state
            .records
            .lock()
            .unwrap()
            .push(Node::published(node.address, format!("rec-{}", id)));
        Ok(())
    }

    async fn delete_record(&self, node: &Node) -> Result<()> {
        self.state.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.state
            .call_log
            .lock()
            .unwrap()
            .push(format!("delete {}", node.address));

        let uid = seedsync_core::traits::record_uid(node)?;

        if self
            .state
            .unconfirmed_deletes
            .lock()
            .unwrap()
            .contains(&node.address)
        {
            return Err(Error::malformed("delete response did not report success"));
        }

        self.state
            .records
            .lock()
            .unwrap()
            .retain(|n| n.uid.as_deref() != Some(uid));
        Ok(())
    }

    fn zone(&self) -> &ZoneContext {
        &self.zone
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A NodeSource whose live set the test controls between passes
#[derive(Clone, Default)]
pub struct ControlledNodeSource {
    live: Arc<Mutex<Vec<IpAddr>>>,
    failing: Arc<Mutex<bool>>,
    discover_calls: Arc<AtomicUsize>,
    discover_delay_ms: Arc<AtomicUsize>,
}

impl ControlledNodeSource {
    pub fn new(addresses: &[&str]) -> Self {
        let source = Self::default();
        source.set_live(addresses);
        source
    }

    pub fn set_live(&self, addresses: &[&str]) {
        *self.live.lock().unwrap() = addresses.iter().map(|a| ip(a)).collect();
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn discover_calls(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }

    /// Make every discovery take `ms` milliseconds
    pub fn set_discover_delay_ms(&self, ms: usize) {
        self.discover_delay_ms.store(ms, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl NodeSource for ControlledNodeSource {
    async fn discover(&self) -> Result<NodeSet> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.discover_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay as u64)).await;
        }

        if *self.failing.lock().unwrap() {
            return Err(Error::rpc("daemon unreachable"));
        }
        Ok(NodeSet::from_addresses(self.live.lock().unwrap().clone()))
    }

    fn source_name(&self) -> &'static str {
        "controlled"
    }
}
