//! Top-level reconciliation entry points
//!
//! [`ReconciliationEngine`] is the pure core: two record lists and settings
//! in, the full result set out. [`ReconciliationService`] wraps it with the
//! caller-boundary concerns the engine deliberately avoids: settings and
//! record validation, the row cap, and persistence through a
//! [`ResultStore`](crate::traits::ResultStore).

use std::collections::HashSet;

use tracing::info;
use uuid::Uuid;

use crate::cluster::{ClusterBuilder, REFERENCE_PREFIX};
use crate::matching::MatchingEngine;
use crate::traits::{DefaultRecordValidator, RecordValidator, ResultStore};
use crate::types::{
    ClusterData, JobSettings, ReconError, ReconResult, ReconciliationOutcome,
    ReconciliationReport, RecordSource, TransactionRecord,
};
use crate::utils::validate_settings;

/// Unclustered ledger residue under this amount with a provider reference is
/// treated as fee noise
const RESIDUAL_FEE_CEILING_CENTS: i64 = 10_000;

/// Derives the true cash-impact total from clusters plus any leftovers no
/// cluster captured
pub struct UnmatchedAmountCalculator;

impl UnmatchedAmountCalculator {
    /// Corrected unmatched total in minor units
    ///
    /// Sums the signed amounts of cash-impacting clusters, then adds
    /// unclustered records, skipping failed payouts and small
    /// provider-referenced ledger residue. The result reflects only genuine,
    /// uninvestigated imbalance.
    pub fn total(clusters: &[ClusterData], unmatched: &[TransactionRecord]) -> i64 {
        let clustered: HashSet<&str> = clusters
            .iter()
            .flat_map(|cluster| cluster.records.iter().map(|record| record.id.as_str()))
            .collect();

        let mut total: i64 = clusters
            .iter()
            .filter(|cluster| cluster.status.has_cash_impact())
            .map(|cluster| cluster.amount)
            .sum();

        for record in unmatched {
            if clustered.contains(record.id.as_str()) {
                continue;
            }
            if record.source == RecordSource::Payout && record.is_failed() {
                continue;
            }
            if record.source == RecordSource::Ledger
                && record.amount_cents.abs() < RESIDUAL_FEE_CEILING_CENTS
                && record.reference_str().starts_with(REFERENCE_PREFIX)
            {
                continue;
            }
            total += record.amount_cents;
        }

        total
    }
}

/// Composes matching, clustering, and the corrected total into one run
///
/// A pure function of its inputs: no I/O, no shared state, safe to run
/// concurrently for different jobs.
pub struct ReconciliationEngine {
    settings: JobSettings,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new(JobSettings::default())
    }
}

impl ReconciliationEngine {
    /// Create an engine for one job's settings
    pub fn new(settings: JobSettings) -> Self {
        Self { settings }
    }

    /// Settings this engine runs with
    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    /// Reconcile a payout list against a ledger list
    pub fn reconcile(
        &self,
        payouts: &[TransactionRecord],
        ledger: &[TransactionRecord],
    ) -> ReconciliationOutcome {
        let matches = MatchingEngine::new(self.settings.clone()).run(payouts, ledger);

        let matched_payout_ids: HashSet<&str> =
            matches.iter().map(|m| m.payout_id.as_str()).collect();
        let matched_ledger_ids: HashSet<&str> =
            matches.iter().map(|m| m.ledger_id.as_str()).collect();

        let (matched_payouts, unmatched_payouts): (Vec<_>, Vec<_>) = payouts
            .iter()
            .cloned()
            .partition(|record| matched_payout_ids.contains(record.id.as_str()));
        let (matched_ledger, unmatched_ledger): (Vec<_>, Vec<_>) = ledger
            .iter()
            .cloned()
            .partition(|record| matched_ledger_ids.contains(record.id.as_str()));

        // Payouts first so their references take precedence in the matched
        // context.
        let mut matched_records = matched_payouts;
        matched_records.extend(matched_ledger);
        let mut unmatched_records = unmatched_payouts.clone();
        unmatched_records.extend(unmatched_ledger.iter().cloned());

        let clusters = ClusterBuilder::build(&unmatched_records, &matched_records);
        let total_unmatched_amount_cents =
            UnmatchedAmountCalculator::total(&clusters, &unmatched_records);

        let matched_count = matches.len();
        let unmatched_count = unmatched_records.len();
        let match_rate = if payouts.is_empty() {
            0.0
        } else {
            matched_count as f64 / payouts.len() as f64
        };

        info!(
            matched = matched_count,
            unmatched = unmatched_count,
            clusters = clusters.len(),
            total_unmatched_cents = total_unmatched_amount_cents,
            "reconciliation run complete"
        );

        ReconciliationOutcome {
            matches,
            clusters,
            unmatched_payouts,
            unmatched_ledger,
            total_unmatched_amount_cents,
            matched_count,
            unmatched_count,
            match_rate,
        }
    }
}

/// Storage-backed wrapper around the pure engine
///
/// Validates everything the engine assumes its callers already checked, then
/// persists the finished report.
pub struct ReconciliationService<S: ResultStore> {
    store: S,
    validator: Box<dyn RecordValidator>,
}

impl<S: ResultStore> ReconciliationService<S> {
    /// Create a service with the default record validator
    pub fn new(store: S) -> Self {
        Self {
            store,
            validator: Box::new(DefaultRecordValidator),
        }
    }

    /// Create a service with a custom record validator
    pub fn with_validator(store: S, validator: Box<dyn RecordValidator>) -> Self {
        Self { store, validator }
    }

    /// Validate inputs, run the engine, and persist the report
    pub async fn run_job(
        &mut self,
        payouts: Vec<TransactionRecord>,
        ledger: Vec<TransactionRecord>,
        settings: JobSettings,
    ) -> ReconResult<ReconciliationReport> {
        validate_settings(&settings)?;

        let rows = payouts.len() + ledger.len();
        if rows > settings.max_rows {
            return Err(ReconError::Validation(format!(
                "Job has {} rows, exceeding the cap of {}",
                rows, settings.max_rows
            )));
        }

        self.validator.validate_batch(&payouts)?;
        self.validator.validate_batch(&ledger)?;

        let outcome = ReconciliationEngine::new(settings.clone()).reconcile(&payouts, &ledger);
        let report = ReconciliationReport {
            job_id: Uuid::new_v4(),
            settings,
            outcome,
            created_at: chrono::Utc::now().naive_utc(),
        };

        self.store.save_report(&report).await?;
        Ok(report)
    }

    /// Fetch a persisted report, erroring when the job is unknown
    pub async fn get_report(&self, job_id: Uuid) -> ReconResult<ReconciliationReport> {
        self.store
            .get_report(job_id)
            .await?
            .ok_or_else(|| ReconError::JobNotFound(job_id.to_string()))
    }

    /// List every persisted report
    pub async fn list_reports(&self) -> ReconResult<Vec<ReconciliationReport>> {
        self.store.list_reports().await
    }
}
