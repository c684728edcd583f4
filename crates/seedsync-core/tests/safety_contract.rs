//! Contract Test: Mutation Safety
//!
//! Constraints verified:
//! - No mutation happens when the live set cannot be discovered
//! - Deletions run before insertions, each set in its own order
//! - One failed mutation never stops its siblings
//! - A deletion the backend does not confirm is reported as a failure

mod common;

use common::*;
use seedsync_core::{AbortReason, MutationKind, PassOutcome, Reconciler};

#[tokio::test]
async fn discovery_failure_aborts_before_touching_dns() {
    let provider = MockDnsProvider::with_records(&[("9.9.9.9", "B")]);
    let source = ControlledNodeSource::new(&["1.2.3.4"]);
    source.set_failing(true);

    let (reconciler, _events) = Reconciler::new(
        Box::new(source),
        Box::new(provider.clone()),
        fast_config(),
    )
    .expect("reconciler construction succeeds");

    let outcome = reconciler.run_pass().await;

    assert!(matches!(
        outcome,
        PassOutcome::Aborted {
            reason: AbortReason::DiscoveryFailed(_)
        }
    ));
    assert_eq!(provider.get_calls(), 0);
    assert_eq!(provider.mutation_calls(), 0);
}

#[tokio::test]
async fn deletions_run_before_insertions() {
    let provider = MockDnsProvider::with_records(&[
        ("9.9.9.9", "B"),
        ("1.2.3.4", "A"),
        ("8.8.8.8", "C"),
    ]);
    let source = ControlledNodeSource::new(&["5.6.7.8", "1.2.3.4", "6.6.6.6"]);

    let (reconciler, _events) = Reconciler::new(
        Box::new(source),
        Box::new(provider.clone()),
        fast_config(),
    )
    .expect("reconciler construction succeeds");

    reconciler.run_pass().await;

    assert_eq!(
        provider.call_log(),
        vec![
            "delete 9.9.9.9",
            "delete 8.8.8.8",
            "add 5.6.7.8",
            "add 6.6.6.6"
        ]
    );
}

#[tokio::test]
async fn failures_do_not_stop_sibling_mutations() {
    let provider = MockDnsProvider::with_records(&[("9.9.9.9", "B"), ("8.8.8.8", "C")]);
    provider.unconfirm_deletes_for("9.9.9.9");
    provider.fail_adds_for("5.6.7.8");
    let source = ControlledNodeSource::new(&["5.6.7.8", "6.6.6.6"]);

    let (reconciler, _events) = Reconciler::new(
        Box::new(source),
        Box::new(provider.clone()),
        fast_config(),
    )
    .expect("reconciler construction succeeds");

    let outcome = reconciler.run_pass().await;
    let report = outcome.report().expect("pass was applied");

    assert!(!report.is_success());
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.failed(), 2);
    assert_eq!(report.removed(), 1);
    assert_eq!(report.added(), 1);

    let failed: Vec<_> = report
        .outcomes
        .iter()
        .filter(|o| !o.is_success())
        .map(|o| (o.kind, o.node.address))
        .collect();
    assert_eq!(
        failed,
        vec![
            (MutationKind::Remove, ip("9.9.9.9")),
            (MutationKind::Add, ip("5.6.7.8")),
        ]
    );

    assert_eq!(
        provider.published_addresses(),
        vec![ip("6.6.6.6"), ip("9.9.9.9")]
    );
}

#[tokio::test]
async fn unconfirmed_deletion_carries_error_text() {
    let provider = MockDnsProvider::with_records(&[("9.9.9.9", "B")]);
    provider.unconfirm_deletes_for("9.9.9.9");
    let source = ControlledNodeSource::new(&[]);

    let (reconciler, _events) = Reconciler::new(
        Box::new(source),
        Box::new(provider.clone()),
        fast_config(),
    )
    .expect("reconciler construction succeeds");

    let outcome = reconciler.run_pass().await;
    let report = outcome.report().expect("pass was applied");

    let error = report.outcomes[0].error.as_deref().expect("deletion failed");
    assert!(error.contains("did not report success"));
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn empty_zone_is_populated() {
    let provider = MockDnsProvider::new();
    let source = ControlledNodeSource::new(&["1.2.3.4", "2001:db8::1"]);

    let (reconciler, _events) = Reconciler::new(
        Box::new(source),
        Box::new(provider.clone()),
        fast_config(),
    )
    .expect("reconciler construction succeeds");

    let outcome = reconciler.run_pass().await;

    assert!(outcome.is_success());
    assert_eq!(provider.delete_calls(), 0);
    assert_eq!(provider.add_calls(), 2);
}
