//! Pass outcomes and events

use crate::node::Node;
use chrono::{DateTime, Utc};
use std::fmt;
use std::net::IpAddr;

/// Kind of record mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Record creation
    Add,
    /// Record deletion
    Remove,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Add => write!(f, "insertion"),
            MutationKind::Remove => write!(f, "deletion"),
        }
    }
}

/// Result of one record mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub kind: MutationKind,
    pub node: Node,
    /// Error text when the mutation failed
    pub error: Option<String>,
}

impl MutationOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Why a pass made no mutations at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// The live set could not be discovered
    DiscoveryFailed(String),
    /// Every listing attempt failed; the published state is unknown
    PublishedUnknown {
        /// Listing attempts made
        attempts: usize,
    },
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::DiscoveryFailed(e) => write!(f, "live node discovery failed: {}", e),
            AbortReason::PublishedUnknown { attempts } => write!(
                f,
                "published records unknown after {} attempt(s)",
                attempts
            ),
        }
    }
}

/// Summary of a pass that reached the apply step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// When the pass started
    pub started_at: DateTime<Utc>,
    /// Size of the live set used for the diff
    pub live: usize,
    /// Size of the published set used for the diff
    pub published: usize,
    /// Per-node results, deletions first
    pub outcomes: Vec<MutationOutcome>,
}

impl PassReport {
    /// True only when every mutation succeeded
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(MutationOutcome::is_success)
    }

    /// Successful insertions
    pub fn added(&self) -> usize {
        self.count(MutationKind::Add)
    }

    /// Successful deletions
    pub fn removed(&self) -> usize {
        self.count(MutationKind::Remove)
    }

    /// Failed mutations of either kind
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    fn count(&self, kind: MutationKind) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.kind == kind && o.is_success())
            .count()
    }
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// No mutations were attempted
    Aborted { reason: AbortReason },
    /// The diff was applied
    Applied(PassReport),
}

impl PassOutcome {
    /// Whether the pass ran and every mutation succeeded
    pub fn is_success(&self) -> bool {
        match self {
            PassOutcome::Aborted { .. } => false,
            PassOutcome::Applied(report) => report.is_success(),
        }
    }

    /// The report, if the pass reached the apply step
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            PassOutcome::Aborted { .. } => None,
            PassOutcome::Applied(report) => Some(report),
        }
    }
}

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilerEvent {
    /// Reconciler loop started
    Started { fulldomain_name: String },

    /// A pass started
    PassStarted,

    /// A stale record was deleted
    RecordRemoved { address: IpAddr },

    /// A record was created for a live node
    RecordAdded { address: IpAddr },

    /// A mutation failed
    MutationFailed {
        address: IpAddr,
        kind: MutationKind,
        error: String,
    },

    /// A pass was aborted before any mutation
    PassAborted { reason: AbortReason },

    /// A pass applied its diff
    PassCompleted {
        added: usize,
        removed: usize,
        failed: usize,
    },

    /// Reconciler loop stopped
    Stopped { reason: String },
}
