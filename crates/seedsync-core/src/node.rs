//! Node model
//!
//! A [`Node`] is one address that is either live (reported by peer
//! discovery) or published (present as an address record in the zone).
//! A [`NodeSet`] is an ordered collection of nodes queried by address.
//!
//! Identity is the address. The `uid` is provider-assigned metadata that is
//! only present on nodes fetched from a DNS backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// A single peer address, optionally tied to a published record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// The peer address
    pub address: IpAddr,

    /// Provider-assigned record identifier (set only for published nodes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl Node {
    /// Create a live node (no record identifier yet)
    pub fn live(address: IpAddr) -> Self {
        Self { address, uid: None }
    }

    /// Create a node backed by a published record
    pub fn published(address: IpAddr, uid: impl Into<String>) -> Self {
        Self {
            address,
            uid: Some(uid.into()),
        }
    }

    /// Whether `other` describes the same logical record
    ///
    /// Only the address is compared; `uid` is ignored.
    pub fn same_record(&self, other: &Node) -> bool {
        self.address == other.address
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.uid {
            Some(uid) => write!(f, "{} (uid={})", self.address, uid),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Ordered, append-only collection of nodes
///
/// Duplicates are not filtered: a set built from a backend listing reflects
/// exactly what the backend returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeSet {
    nodes: Vec<Node>,
}

impl NodeSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a live set from plain addresses
    pub fn from_addresses<I>(addresses: I) -> Self
    where
        I: IntoIterator<Item = IpAddr>,
    {
        addresses.into_iter().map(Node::live).collect()
    }

    /// Append a node
    pub fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Whether any node in the set has `address`
    pub fn contains_address(&self, address: &IpAddr) -> bool {
        self.nodes.iter().any(|n| n.address == *address)
    }

    /// First node with `address`, if any
    pub fn get(&self, address: &IpAddr) -> Option<&Node> {
        self.nodes.iter().find(|n| n.address == *address)
    }

    /// Addresses in insertion order
    pub fn addresses(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.nodes.iter().map(|n| n.address)
    }

    /// Iterate nodes in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Keep only the first `max` nodes
    pub fn truncate(&mut self, max: usize) {
        self.nodes.truncate(max);
    }
}

impl FromIterator<Node> for NodeSet {
    fn from_iter<T: IntoIterator<Item = Node>>(iter: T) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for NodeSet {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn identity_is_the_address() {
        let live = Node::live(ip("1.2.3.4"));
        let published = Node::published(ip("1.2.3.4"), "A");

        assert!(live.same_record(&published));
        assert_ne!(live, published);
        assert!(!live.same_record(&Node::live(ip("1.2.3.5"))));
    }

    #[test]
    fn lookup_by_address_returns_first_match() {
        let mut set = NodeSet::new();
        set.push(Node::published(ip("1.2.3.4"), "first"));
        set.push(Node::published(ip("1.2.3.4"), "second"));

        assert_eq!(set.len(), 2, "duplicates are kept as returned");
        assert_eq!(set.get(&ip("1.2.3.4")).unwrap().uid.as_deref(), Some("first"));
        assert!(set.get(&ip("9.9.9.9")).is_none());
    }

    #[test]
    fn preserves_insertion_order() {
        let set = NodeSet::from_addresses([ip("5.6.7.8"), ip("1.2.3.4"), ip("::1")]);
        let addresses: Vec<_> = set.addresses().collect();
        assert_eq!(addresses, vec![ip("5.6.7.8"), ip("1.2.3.4"), ip("::1")]);
        assert!(set.iter().all(|n| n.uid.is_none()));
    }

    #[test]
    fn display_includes_uid_when_published() {
        assert_eq!(Node::live(ip("1.2.3.4")).to_string(), "1.2.3.4");
        assert_eq!(
            Node::published(ip("1.2.3.4"), "abc").to_string(),
            "1.2.3.4 (uid=abc)"
        );
    }
}
