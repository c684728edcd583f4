//! Live versus published diff
//!
//! Addresses are the diff key. A published node is kept when any live node
//! has its address, no matter which `uid` it carries.

use crate::node::NodeSet;

/// Mutations needed to make the published set match the live set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    /// Live nodes with no published record, in live-set order
    pub to_add: NodeSet,
    /// Published records whose address is no longer live, in published-set order
    pub to_remove: NodeSet,
}

impl Diff {
    /// Compute the diff between `live` and `published`
    ///
    /// A live address that appears several times is added once.
    pub fn compute(live: &NodeSet, published: &NodeSet) -> Self {
        let mut to_add = NodeSet::new();
        for node in live {
            if !published.contains_address(&node.address) && !to_add.contains_address(&node.address)
            {
                to_add.push(node.clone());
            }
        }

        let to_remove = published
            .iter()
            .filter(|node| !live.contains_address(&node.address))
            .cloned()
            .collect();

        Self { to_add, to_remove }
    }

    /// Whether the published set already matches the live set
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Total number of mutations
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }
}
