//! Integration tests for reconciliation-core

use reconciliation_core::{
    utils::{EnhancedRecordValidator, MemoryResultStore},
    ClusterBuilder, ClusterStatus, ConfidenceLevel, EntryKind, JobSettings, JsonExporter,
    MatchType, OutcomeExporter, PayoutStatus, ReconError, ReconciliationEngine,
    ReconciliationReport, ReconciliationService, TransactionRecord, UnmatchedAmountCalculator,
};

fn job_settings() -> JobSettings {
    JobSettings {
        amount_tolerance_cents: 100,
        time_window_hours: 48.0,
        fuzzy_threshold: 85,
        max_rows: 10_000,
    }
}

/// A mixed job exercising every pass and every cluster rule at once
fn sample_job() -> (Vec<TransactionRecord>, Vec<TransactionRecord>) {
    let payouts = vec![
        // Matches l-100 on transaction id.
        TransactionRecord::payout("p-100", 10_000, "USD")
            .with_status(PayoutStatus::Success)
            .with_tx_id("T-100")
            .with_reference("TXN-100")
            .with_timestamp("2024-03-01T09:00:00Z"),
        // Matches l-200 on reference, one hour and five cents apart.
        TransactionRecord::payout("p-200", 5_000, "USD")
            .with_status(PayoutStatus::Success)
            .with_reference("INV-1")
            .with_timestamp("2024-03-01T10:00:00Z"),
        // Failed payout, matches nothing and costs nothing.
        TransactionRecord::payout("p-300", 8_000, "USD").with_status(PayoutStatus::Failed),
        // Orphan payout with no candidate anywhere.
        TransactionRecord::payout("p-400", 9_999_999, "USD").with_status(PayoutStatus::Success),
        // Reversed payout, matched against the returning credit.
        TransactionRecord::payout("p-500", 20_000, "USD")
            .with_status(PayoutStatus::Reversed)
            .with_reference("TXN-500"),
    ];

    let ledger = vec![
        TransactionRecord::ledger_entry("l-100", -10_000, "USD")
            .with_kind(EntryKind::Debit)
            .with_tx_id("T-100")
            .with_reference("TXN-100")
            .with_timestamp("2024-03-01T09:30:00Z"),
        // Provider fee riding on the matched TXN-100 payout.
        TransactionRecord::ledger_entry("l-101", 150, "USD").with_reference("TXN-100"),
        TransactionRecord::ledger_entry("l-200", -5_005, "USD")
            .with_kind(EntryKind::Debit)
            .with_reference("INV-1")
            .with_timestamp("2024-03-01T11:00:00Z"),
        // The credit returning p-500's money.
        TransactionRecord::ledger_entry("l-500", 20_000, "USD")
            .with_kind(EntryKind::Credit)
            .with_reference("TXN-500"),
        // The original outflow of the reversed payout, left behind.
        TransactionRecord::ledger_entry("l-501", -20_000, "USD")
            .with_kind(EntryKind::Debit)
            .with_reference("TXN-500"),
        // Known internal noise.
        TransactionRecord::ledger_entry("l-600", -333, "USD").with_reference("NOISE-7"),
    ];

    (payouts, ledger)
}

#[test]
fn test_complete_reconciliation_workflow() {
    let (payouts, ledger) = sample_job();
    let outcome = ReconciliationEngine::new(job_settings()).reconcile(&payouts, &ledger);

    // Three matches: exact id, exact reference, reversed credit.
    assert_eq!(outcome.matched_count, 3);
    assert_eq!(outcome.match_rate, 3.0 / 5.0);
    assert_eq!(outcome.unmatched_count, 5);

    let exact_id = outcome
        .matches
        .iter()
        .find(|m| m.payout_id == "p-100")
        .unwrap();
    assert_eq!(exact_id.ledger_id, "l-100");
    assert_eq!(exact_id.match_type, MatchType::Exact);
    assert!((exact_id.score - 1.0).abs() < f64::EPSILON);
    assert_eq!(exact_id.confidence_level, ConfidenceLevel::High);

    let by_reference = outcome
        .matches
        .iter()
        .find(|m| m.payout_id == "p-200")
        .unwrap();
    assert_eq!(by_reference.ledger_id, "l-200");
    assert!((by_reference.score_breakdown.amount_score - 0.95).abs() < 1e-9);
    assert_eq!(by_reference.score_breakdown.time_score, 1.0);
    assert!(by_reference.score > 0.95);

    let reversed = outcome
        .matches
        .iter()
        .find(|m| m.payout_id == "p-500")
        .unwrap();
    assert_eq!(reversed.ledger_id, "l-500");

    // Cluster statuses in priority order: failed, reversed, fee, then the
    // two unmatched groups largest first.
    let statuses: Vec<ClusterStatus> = outcome.clusters.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![
            ClusterStatus::Failed,
            ClusterStatus::Reversed,
            ClusterStatus::Fee,
            ClusterStatus::Unmatched,
            ClusterStatus::Unmatched,
        ]
    );
    assert_eq!(outcome.clusters[3].pivot_id, "p-400");
    assert_eq!(outcome.clusters[4].records[0].id, "l-600");
    assert_eq!(outcome.clusters[0].notes, "Failed payouts #1 (1 record)");
    assert_eq!(outcome.clusters[3].notes, "Unmatched #1 (1 record)");
    assert_eq!(outcome.clusters[4].notes, "Unmatched #2 (1 record)");

    // Only the orphan payout and the noise entry carry cash impact.
    assert_eq!(outcome.total_unmatched_amount_cents, 9_999_999 - 333);
}

#[test]
fn test_fee_pair_is_grouped_and_excluded() {
    // Two ledger entries share a provider reference; the 150 is 1.5% of the
    // 10_000 main amount.
    let unmatched = vec![
        TransactionRecord::ledger_entry("main", 10_000, "USD").with_reference("TXN-100"),
        TransactionRecord::ledger_entry("fee", 150, "USD").with_reference("TXN-100"),
    ];

    let clusters = ClusterBuilder::build(&unmatched, &[]);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].status, ClusterStatus::Fee);
    assert_eq!(clusters[0].size, 2);

    assert_eq!(UnmatchedAmountCalculator::total(&clusters, &unmatched), 0);
}

#[test]
fn test_identical_inputs_produce_identical_results() {
    let (payouts, ledger) = sample_job();
    let engine = ReconciliationEngine::new(job_settings());

    let first = engine.reconcile(&payouts, &ledger);
    let second = engine.reconcile(&payouts, &ledger);

    assert_eq!(first.matches, second.matches);
    assert_eq!(first.clusters, second.clusters);
    assert_eq!(
        first.total_unmatched_amount_cents,
        second.total_unmatched_amount_cents
    );
}

#[test]
fn test_no_id_is_matched_twice() {
    let (payouts, ledger) = sample_job();
    let outcome = ReconciliationEngine::new(job_settings()).reconcile(&payouts, &ledger);

    let mut seen = std::collections::HashSet::new();
    for result in &outcome.matches {
        assert!(seen.insert(result.payout_id.clone()));
        assert!(seen.insert(result.ledger_id.clone()));
    }

    // Matched and unmatched partitions are disjoint as well.
    for record in outcome
        .unmatched_payouts
        .iter()
        .chain(outcome.unmatched_ledger.iter())
    {
        assert!(!seen.contains(&record.id));
    }
}

#[test]
fn test_cluster_evidence_mirrors_clusters() {
    let (payouts, ledger) = sample_job();
    let outcome = ReconciliationEngine::new(job_settings()).reconcile(&payouts, &ledger);

    let evidence = outcome.cluster_evidence();
    assert_eq!(evidence.len(), outcome.clusters.len());
    for (row, cluster) in evidence.iter().zip(outcome.clusters.iter()) {
        assert_eq!(row.label, cluster.notes);
        assert_eq!(row.status, cluster.status);
        assert_eq!(row.members.len(), cluster.size);
    }
}

#[tokio::test]
async fn test_service_runs_and_persists_job() {
    let store = MemoryResultStore::new();
    let mut service = ReconciliationService::new(store);

    let (payouts, ledger) = sample_job();
    let report = service
        .run_job(payouts, ledger, job_settings())
        .await
        .unwrap();
    assert_eq!(report.outcome.matched_count, 3);

    let fetched = service.get_report(report.job_id).await.unwrap();
    assert_eq!(fetched, report);

    let listed = service.list_reports().await.unwrap();
    assert_eq!(listed.len(), 1);

    // Unknown jobs are reported as such.
    let missing = service.get_report(uuid::Uuid::new_v4()).await;
    assert!(matches!(missing, Err(ReconError::JobNotFound(_))));
}

#[tokio::test]
async fn test_service_rejects_bad_settings_and_oversized_jobs() {
    let mut service = ReconciliationService::new(MemoryResultStore::new());

    let bad_settings = JobSettings {
        fuzzy_threshold: 130,
        ..job_settings()
    };
    let result = service.run_job(Vec::new(), Vec::new(), bad_settings).await;
    assert!(matches!(result, Err(ReconError::Validation(_))));

    let tiny_cap = JobSettings {
        max_rows: 1,
        ..job_settings()
    };
    let (payouts, ledger) = sample_job();
    let result = service.run_job(payouts, ledger, tiny_cap).await;
    assert!(matches!(result, Err(ReconError::Validation(_))));

    // Nothing was persisted along the way.
    assert!(service.list_reports().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_service_with_enhanced_validator_rejects_mixed_currencies() {
    let mut service = ReconciliationService::with_validator(
        MemoryResultStore::new(),
        Box::new(EnhancedRecordValidator),
    );

    let payouts = vec![
        TransactionRecord::payout("p1", 1_000, "USD"),
        TransactionRecord::payout("p2", 2_000, "EUR"),
    ];
    let result = service.run_job(payouts, Vec::new(), job_settings()).await;
    assert!(matches!(result, Err(ReconError::Validation(_))));
}

#[test]
fn test_json_export_of_full_report() {
    let (payouts, ledger) = sample_job();
    let outcome = ReconciliationEngine::new(job_settings()).reconcile(&payouts, &ledger);
    let report = ReconciliationReport {
        job_id: uuid::Uuid::new_v4(),
        settings: job_settings(),
        outcome,
        created_at: chrono::Utc::now().naive_utc(),
    };

    let exporter = JsonExporter;
    assert_eq!(exporter.content_type(), "application/json");

    let bytes = exporter.export(&report).unwrap();
    let parsed: ReconciliationReport = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed, report);
}
