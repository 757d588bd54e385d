//! Cluster assembly, ordering, and labeling

use std::cmp::Reverse;
use std::collections::HashMap;

use tracing::debug;

use crate::cluster::rules::{
    failed_payout_rule, noise_rule, reference_group_rules, remainder_rule, MatchedContext,
};
use crate::types::{ClusterData, ClusterStatus, TransactionRecord};

/// Categorizes leftover records into labeled exception clusters
///
/// Rules run in priority order over a working copy of the unmatched set, so
/// every unmatched record lands in exactly one cluster. Matched records are
/// consulted, never clustered.
pub struct ClusterBuilder;

impl ClusterBuilder {
    /// Build the full cluster list for one run
    pub fn build(
        unmatched: &[TransactionRecord],
        matched: &[TransactionRecord],
    ) -> Vec<ClusterData> {
        let context = MatchedContext::new(matched);
        let mut pending = unmatched.to_vec();
        let mut clusters = Vec::new();

        clusters.extend(failed_payout_rule(&mut pending));
        clusters.extend(noise_rule(&mut pending));
        clusters.extend(reference_group_rules(&mut pending, &context));
        clusters.extend(remainder_rule(&mut pending, &context));
        debug_assert!(pending.is_empty(), "remainder rule must drain everything");

        order_and_label(&mut clusters);
        debug!(
            clusters = clusters.len(),
            records = unmatched.len(),
            "clustered unmatched records"
        );
        clusters
    }
}

/// Sort by status priority then absolute amount, and hand out sequential
/// per-status labels
fn order_and_label(clusters: &mut [ClusterData]) {
    clusters.sort_by_key(|cluster| (cluster.status.priority(), Reverse(cluster.amount.abs())));

    let mut counters: HashMap<ClusterStatus, usize> = HashMap::new();
    for cluster in clusters.iter_mut() {
        let counter = counters.entry(cluster.status).or_insert(0);
        *counter += 1;
        let records = if cluster.size == 1 { "record" } else { "records" };
        cluster.notes = format!(
            "{} #{} ({} {})",
            cluster.status.label(),
            counter,
            cluster.size,
            records
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PayoutStatus;

    fn ledger(id: &str, amount: i64, reference: &str) -> TransactionRecord {
        TransactionRecord::ledger_entry(id, amount, "USD").with_reference(reference)
    }

    #[test]
    fn test_rule_order_and_cluster_disjointness() {
        let unmatched = vec![
            TransactionRecord::payout("failed", 4_000, "USD")
                .with_status(PayoutStatus::Failed)
                .with_reference("TXN-1"),
            ledger("noise", -250, "NOISE-x"),
            ledger("main", 10_000, "TXN-1"),
            ledger("fee", 150, "TXN-1"),
            TransactionRecord::payout("orphan", 77_000, "USD"),
        ];

        let clusters = ClusterBuilder::build(&unmatched, &[]);

        // Failed payout is claimed before the TXN- grouping can see it.
        let failed: Vec<_> = clusters
            .iter()
            .filter(|c| c.status == ClusterStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].records[0].id, "failed");

        // Every unmatched record appears in exactly one cluster.
        let mut ids: Vec<_> = clusters
            .iter()
            .flat_map(|c| c.records.iter().map(|r| r.id.clone()))
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["failed", "fee", "main", "noise", "orphan"]);
    }

    #[test]
    fn test_clusters_sort_by_priority_then_amount() {
        let unmatched = vec![
            TransactionRecord::payout("big-orphan", 500_000, "USD"),
            TransactionRecord::payout("small-orphan", 1_000, "USD"),
            TransactionRecord::payout("failed", 9_000, "USD").with_status(PayoutStatus::Failed),
        ];

        let clusters = ClusterBuilder::build(&unmatched, &[]);

        assert_eq!(clusters[0].status, ClusterStatus::Failed);
        assert_eq!(clusters[1].records[0].id, "big-orphan");
        assert_eq!(clusters[2].records[0].id, "small-orphan");
    }

    #[test]
    fn test_labels_are_sequential_per_status() {
        let unmatched = vec![
            TransactionRecord::payout("a", 500_000, "USD"),
            TransactionRecord::payout("b", 1_000, "USD"),
        ];

        let clusters = ClusterBuilder::build(&unmatched, &[]);

        assert_eq!(clusters[0].notes, "Unmatched #1 (1 record)");
        assert_eq!(clusters[1].notes, "Unmatched #2 (1 record)");
    }

    #[test]
    fn test_build_is_idempotent() {
        let unmatched = vec![
            ledger("l1", -300, "TXN-5"),
            ledger("l2", 10_000, "TXN-5"),
            ledger("l3", -120, "NOISE-1"),
            TransactionRecord::payout("p1", 42_000, "USD"),
        ];
        let matched =
            vec![TransactionRecord::payout("m1", 10_000, "USD").with_reference("TXN-5")];

        let first = ClusterBuilder::build(&unmatched, &matched);
        let second = ClusterBuilder::build(&unmatched, &matched);
        assert_eq!(first, second);
    }
}
