//! Reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Discovering the live node set via NodeSource
//! - Fetching the published records via DnsProvider (with bounded retry)
//! - Diffing the two sets by address
//! - Applying deletions, then insertions, one at a time
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐                      ┌──────────────┐
//! │ NodeSource  │── live NodeSet ─────▶│              │
//! └─────────────┘                      │  Reconciler  │──▶ ReconcilerEvent
//! ┌─────────────┐                      │              │
//! │ DnsProvider │── published NodeSet ▶│   (diff)     │
//! │             │◀─ delete / add ──────│              │
//! └─────────────┘                      └──────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. Discover live nodes; on failure abort the pass
//! 2. Fetch published records, retrying up to `max_fetch_retries` times;
//!    if every attempt fails abort the pass (the zone state is unknown,
//!    not empty)
//! 3. Compute the diff
//! 4. Delete stale records, then create missing ones; each mutation is
//!    attempted exactly once and a failure never stops its siblings
//! 5. Report per-node outcomes

mod diff;
mod report;

pub use diff::Diff;
pub use report::{
    AbortReason, MutationKind, MutationOutcome, PassOutcome, PassReport, ReconcilerEvent,
};

use crate::config::ReconcilerConfig;
use crate::error::Result;
use crate::node::{Node, NodeSet};
use crate::traits::{DnsProvider, NodeSource};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

/// Core reconciliation engine
///
/// One Reconciler manages one zone through one provider. Passes run
/// sequentially and mutations inside a pass are applied one at a time, so
/// two creates for the same address can never race on the backend.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Either call [`Reconciler::run_pass()`] once, or start the periodic
///    loop with [`Reconciler::run()`]
/// 3. The loop runs until a shutdown signal is received
///
/// Nothing is cached between passes: both node sets are fetched fresh and
/// dropped once the diff is applied.
pub struct Reconciler {
    /// Live-node discovery
    source: Box<dyn NodeSource>,

    /// DNS provider for the managed zone
    provider: Box<dyn DnsProvider>,

    /// Reconciler settings
    config: ReconcilerConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcilerEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `source`: Live-node source
    /// - `provider`: DNS provider, already bound to its zone
    /// - `config`: Reconciler configuration
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields reconciler events
    pub fn new(
        source: Box<dyn NodeSource>,
        provider: Box<dyn DnsProvider>,
        config: ReconcilerConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcilerEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let reconciler = Self {
            source,
            provider,
            config,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Fetch the published records with bounded retry
    ///
    /// Makes at most `max_fetch_retries + 1` attempts with a fixed delay
    /// between them.
    ///
    /// # Returns
    ///
    /// - `Some(NodeSet)`: The published records
    /// - `None`: Every attempt failed; the published state is unknown and
    ///   must not be mutated against
    pub async fn fetch_published(&self) -> Option<NodeSet> {
        let fulldomain = self.provider.zone().fulldomain_name();
        info!("Fetching existing record(s) ({})", fulldomain);

        let delay = self.config.fetch_retry_delay();
        for attempt in 0..=self.config.max_fetch_retries {
            match self.provider.get_records().await {
                Ok(published) => {
                    for node in &published {
                        debug!("> A {} {}", fulldomain, node.address);
                    }
                    return Some(published);
                }
                Err(e) => {
                    error!(
                        "{} record fetching failed (attempt {}/{}): {}",
                        self.provider.provider_name(),
                        attempt + 1,
                        self.config.max_fetch_retries + 1,
                        e
                    );

                    if attempt < self.config.max_fetch_retries {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        warn!(
            "Giving up on fetching records for {} after {} attempt(s)",
            fulldomain,
            self.config.max_fetch_retries + 1
        );
        None
    }

    /// Run one reconciliation pass
    ///
    /// Never fails: every error is logged and folded into the returned
    /// [`PassOutcome`].
    pub async fn run_pass(&self) -> PassOutcome {
        let started_at = chrono::Utc::now();
        self.emit_event(ReconcilerEvent::PassStarted);

        let mut live = match self.source.discover().await {
            Ok(live) => live,
            Err(e) => {
                error!(
                    "Live node discovery via {} failed: {}",
                    self.source.source_name(),
                    e
                );
                return self.abort(AbortReason::DiscoveryFailed(e.to_string()));
            }
        };

        if let Some(max) = self.config.max_records
            && live.len() > max
        {
            debug!("Capping live set from {} to {} node(s)", live.len(), max);
            live.truncate(max);
        }

        let Some(published) = self.fetch_published().await else {
            return self.abort(AbortReason::PublishedUnknown {
                attempts: self.config.max_fetch_retries + 1,
            });
        };

        let diff = Diff::compute(&live, &published);
        info!(
            "{}: {} live, {} published, {} to remove, {} to add",
            self.provider.zone().fulldomain_name(),
            live.len(),
            published.len(),
            diff.to_remove.len(),
            diff.to_add.len()
        );

        let outcomes = self.apply(&diff).await;
        let report = PassReport {
            started_at,
            live: live.len(),
            published: published.len(),
            outcomes,
        };

        self.emit_event(ReconcilerEvent::PassCompleted {
            added: report.added(),
            removed: report.removed(),
            failed: report.failed(),
        });

        if report.is_success() {
            debug!("Pass completed without failures");
        } else {
            warn!("Pass completed with {} failed mutation(s)", report.failed());
        }

        PassOutcome::Applied(report)
    }

    /// Apply a diff: all deletions first, then all insertions
    ///
    /// Mutations are independent. A failure is recorded and the next
    /// mutation proceeds.
    pub async fn apply(&self, diff: &Diff) -> Vec<MutationOutcome> {
        let mut outcomes = Vec::with_capacity(diff.len());

        for node in &diff.to_remove {
            outcomes.push(self.mutate(MutationKind::Remove, node).await);
        }

        for node in &diff.to_add {
            outcomes.push(self.mutate(MutationKind::Add, node).await);
        }

        outcomes
    }

    /// Perform a single mutation attempt
    async fn mutate(&self, kind: MutationKind, node: &Node) -> MutationOutcome {
        info!("Record {}: {}", kind, node.address);

        let result = match kind {
            MutationKind::Remove => self.provider.delete_record(node).await,
            MutationKind::Add => self.provider.add_record(node).await,
        };

        match result {
            Ok(()) => {
                self.emit_event(match kind {
                    MutationKind::Remove => ReconcilerEvent::RecordRemoved {
                        address: node.address,
                    },
                    MutationKind::Add => ReconcilerEvent::RecordAdded {
                        address: node.address,
                    },
                });

                MutationOutcome {
                    kind,
                    node: node.clone(),
                    error: None,
                }
            }
            Err(e) => {
                error!(
                    "{} record ({}) {} failed: {}",
                    self.provider.provider_name(),
                    node,
                    kind,
                    e
                );

                self.emit_event(ReconcilerEvent::MutationFailed {
                    address: node.address,
                    kind,
                    error: e.to_string(),
                });

                MutationOutcome {
                    kind,
                    node: node.clone(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn abort(&self, reason: AbortReason) -> PassOutcome {
        warn!("Pass aborted, no records changed: {}", reason);
        self.emit_event(ReconcilerEvent::PassAborted {
            reason: reason.clone(),
        });
        PassOutcome::Aborted { reason }
    }

    /// Run passes periodically
    ///
    /// The first pass starts immediately; the next one starts
    /// `pass_interval_secs` later. Runs until SIGINT.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error)`: Fatal error
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Internal run implementation that accepts an optional shutdown signal
    ///
    /// A pass in progress is never interrupted; shutdown is observed
    /// between passes.
    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(ReconcilerEvent::Started {
            fulldomain_name: self.provider.zone().fulldomain_name().to_string(),
        });

        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.pass_interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(interval);

        // Lives across iterations: a signal raised mid-pass is seen after the pass
        let mut shutdown = match shutdown_rx {
            Some(rx) => rx,
            None => {
                let (tx, rx) = tokio::sync::oneshot::channel();
                tokio::spawn(async move {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for SIGINT: {}", e);
                    }
                    let _ = tx.send(());
                });
                rx
            }
        };

        loop {
            tokio::select! {
                Some(_) = ticks.next() => {
                    self.run_pass().await;
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.emit_event(ReconcilerEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
        info!("Reconciler stopped");

        Ok(())
    }

    /// Emit a reconciler event
    fn emit_event(&self, event: ReconcilerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    "Event channel full, dropping event. Consider increasing event_channel_capacity."
                );
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    /// Run the loop until `shutdown_rx` fires
    ///
    /// Used by tests and by callers that watch more signals than SIGINT
    /// (the daemon also stops on SIGTERM). With `None` this is `run()`.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }
}
