//! Core types and data structures for the reconciliation engine

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Which side of the reconciliation a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// Outbound payment record from the external payment provider's export
    Payout,
    /// Internal bookkeeping record
    Ledger,
}

impl RecordSource {
    /// Human-readable name of the source
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSource::Payout => "payout",
            RecordSource::Ledger => "ledger",
        }
    }
}

/// Provider-reported outcome of a payout
///
/// Parsed from the free-form provider payload at ingestion. Unrecognized
/// values are rejected there instead of silently falling through to the
/// generic amount comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayoutStatus {
    /// Money left the provider account
    Success,
    /// No money moved
    Failed,
    /// Money left and came back
    Reversed,
}

impl PayoutStatus {
    /// Parse a provider status string, case-insensitively
    pub fn parse(value: &str) -> ReconResult<Self> {
        match value.to_ascii_uppercase().as_str() {
            "SUCCESS" => Ok(PayoutStatus::Success),
            "FAILED" => Ok(PayoutStatus::Failed),
            "REVERSED" => Ok(PayoutStatus::Reversed),
            other => Err(ReconError::UnknownStatus(other.to_string())),
        }
    }

    /// Provider-facing representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Success => "SUCCESS",
            PayoutStatus::Failed => "FAILED",
            PayoutStatus::Reversed => "REVERSED",
        }
    }
}

/// Bookkeeping direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryKind {
    /// Outflow entry, recorded with a negative amount
    Debit,
    /// Inflow entry, recorded with a positive amount
    Credit,
}

impl EntryKind {
    /// Parse a ledger entry type string, case-insensitively
    pub fn parse(value: &str) -> ReconResult<Self> {
        match value.to_ascii_uppercase().as_str() {
            "DEBIT" => Ok(EntryKind::Debit),
            "CREDIT" => Ok(EntryKind::Credit),
            other => Err(ReconError::UnknownEntryKind(other.to_string())),
        }
    }

    /// Provider-facing representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Debit => "DEBIT",
            EntryKind::Credit => "CREDIT",
        }
    }
}

/// A single transaction from either input list
///
/// Amounts are always signed integer minor currency units; upstream parsers
/// are responsible for normalizing provider files into this shape. The `raw`
/// payload keeps whatever provider-specific fields arrived with the record;
/// `status` and `kind` are the validated projections of its `status` and
/// `type` fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Unique identifier within the job
    pub id: String,
    /// External transaction identifier shared by both sides, when present
    pub tx_id: Option<String>,
    /// Signed amount in minor currency units
    pub amount_cents: i64,
    /// ISO currency code
    pub currency: String,
    /// Raw provider timestamp; parsing is deferred to the temporal comparator
    pub timestamp: Option<String>,
    /// Which input list the record came from
    pub source: RecordSource,
    /// Free-text reference (invoice number, payout batch, etc.)
    pub reference: Option<String>,
    /// Merchant the transaction belongs to, when known
    pub merchant_id: Option<String>,
    /// Validated payout status from the provider payload
    pub status: Option<PayoutStatus>,
    /// Validated entry direction from the provider payload
    pub kind: Option<EntryKind>,
    /// Untouched provider payload
    pub raw: Value,
}

impl TransactionRecord {
    /// Create a new record with the required fields
    pub fn new(
        id: impl Into<String>,
        source: RecordSource,
        amount_cents: i64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            tx_id: None,
            amount_cents,
            currency: currency.into(),
            timestamp: None,
            source,
            reference: None,
            merchant_id: None,
            status: None,
            kind: None,
            raw: Value::Null,
        }
    }

    /// Create a payout record
    pub fn payout(id: impl Into<String>, amount_cents: i64, currency: impl Into<String>) -> Self {
        Self::new(id, RecordSource::Payout, amount_cents, currency)
    }

    /// Create a ledger entry record
    pub fn ledger_entry(
        id: impl Into<String>,
        amount_cents: i64,
        currency: impl Into<String>,
    ) -> Self {
        Self::new(id, RecordSource::Ledger, amount_cents, currency)
    }

    /// Set the external transaction identifier
    pub fn with_tx_id(mut self, tx_id: impl Into<String>) -> Self {
        self.tx_id = Some(tx_id.into());
        self
    }

    /// Set the free-text reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Set the raw provider timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Set the merchant identifier
    pub fn with_merchant_id(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }

    /// Set the payout status directly
    pub fn with_status(mut self, status: PayoutStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the entry direction directly
    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Attach a provider payload, lifting and validating its `status` and
    /// `type` fields
    ///
    /// Fails with [`ReconError::UnknownStatus`] or
    /// [`ReconError::UnknownEntryKind`] when the payload carries a value the
    /// engine does not understand. A payload without those fields is accepted
    /// as-is.
    pub fn with_raw(mut self, raw: Value) -> ReconResult<Self> {
        if let Some(status) = raw.get("status").and_then(Value::as_str) {
            self.status = Some(PayoutStatus::parse(status)?);
        }
        if let Some(kind) = raw.get("type").and_then(Value::as_str) {
            self.kind = Some(EntryKind::parse(kind)?);
        }
        self.raw = raw;
        Ok(self)
    }

    /// Whether this is a payout the provider reported as failed
    pub fn is_failed(&self) -> bool {
        self.status == Some(PayoutStatus::Failed)
    }

    /// Reference string, empty when absent
    pub fn reference_str(&self) -> &str {
        self.reference.as_deref().unwrap_or("")
    }
}

/// How a match was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Identical transaction identifier or identical reference string
    Exact,
    /// Weighted amount/time/reference scoring without textual equality
    Deterministic,
    /// Approximate reference similarity was the deciding factor
    Fuzzy,
}

/// Reviewer-facing confidence bucket derived from the weighted score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// Bucket a weighted score
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            ConfidenceLevel::High
        } else if score >= 0.6 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Fixed component weights used by every pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub exact: u32,
    pub amount: u32,
    pub time: u32,
    pub fuzzy: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            exact: 40,
            amount: 25,
            time: 20,
            fuzzy: 15,
        }
    }
}

/// Per-component scores behind a match, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub exact_match: f64,
    pub amount_score: f64,
    pub time_score: f64,
    pub fuzzy_score: f64,
    pub weights: ScoreWeights,
}

impl ScoreBreakdown {
    /// Build a breakdown with the standard weights
    pub fn new(exact_match: f64, amount_score: f64, time_score: f64, fuzzy_score: f64) -> Self {
        Self {
            exact_match,
            amount_score,
            time_score,
            fuzzy_score,
            weights: ScoreWeights::default(),
        }
    }

    /// Weighted average of the components
    pub fn weighted_score(&self) -> f64 {
        let w = self.weights;
        let total = (w.exact + w.amount + w.time + w.fuzzy) as f64;
        (self.exact_match * w.exact as f64
            + self.amount_score * w.amount as f64
            + self.time_score * w.time as f64
            + self.fuzzy_score * w.fuzzy as f64)
            / total
    }
}

/// One accepted payout/ledger correspondence
///
/// Each transaction id appears in at most one match result, as only one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub payout_id: String,
    pub ledger_id: String,
    /// Weighted score in `[0, 1]`
    pub score: f64,
    pub score_breakdown: ScoreBreakdown,
    pub match_type: MatchType,
    pub confidence_level: ConfidenceLevel,
}

impl MatchResult {
    /// Assemble a result, deriving score and confidence from the breakdown
    pub fn from_breakdown(
        payout_id: impl Into<String>,
        ledger_id: impl Into<String>,
        breakdown: ScoreBreakdown,
        match_type: MatchType,
    ) -> Self {
        let score = breakdown.weighted_score();
        Self {
            payout_id: payout_id.into(),
            ledger_id: ledger_id.into(),
            score,
            score_breakdown: breakdown,
            match_type,
            confidence_level: ConfidenceLevel::from_score(score),
        }
    }
}

/// Classification of an exception cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStatus {
    /// Genuine unexplained cash impact
    Unmatched,
    /// Reference group where only part of the money is accounted for
    Partial,
    /// Closed out downstream by a reviewer; never produced by the builder
    Resolved,
    /// Residue of a reversed payout, no cash impact
    Reversed,
    /// Provider or bank fee riding on a matched transaction, no cash impact
    Fee,
    /// Failed payouts, no money moved
    Failed,
}

impl ClusterStatus {
    /// Sort rank; artifact categories come before open discrepancies
    pub fn priority(&self) -> u8 {
        match self {
            ClusterStatus::Failed => 0,
            ClusterStatus::Reversed => 1,
            ClusterStatus::Fee => 2,
            ClusterStatus::Resolved => 3,
            ClusterStatus::Partial => 4,
            ClusterStatus::Unmatched => 5,
        }
    }

    /// Human-readable group label
    pub fn label(&self) -> &'static str {
        match self {
            ClusterStatus::Unmatched => "Unmatched",
            ClusterStatus::Partial => "Partial reference group",
            ClusterStatus::Resolved => "Resolved",
            ClusterStatus::Reversed => "Reversal residue",
            ClusterStatus::Fee => "Fee group",
            ClusterStatus::Failed => "Failed payouts",
        }
    }

    /// Whether the cluster's amount represents money still unaccounted for
    pub fn has_cash_impact(&self) -> bool {
        !matches!(
            self,
            ClusterStatus::Failed | ClusterStatus::Fee | ClusterStatus::Reversed
        )
    }
}

/// A group of unmatched records sharing a detected exception pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterData {
    /// Representative record (largest absolute amount in the group)
    pub pivot_id: String,
    /// Which side the pivot came from
    pub pivot_type: RecordSource,
    /// Member records, disjoint from every other cluster
    pub records: Vec<TransactionRecord>,
    /// Signed sum of member amounts in minor units
    pub amount: i64,
    pub status: ClusterStatus,
    /// Sequential human-readable label for the cluster
    pub notes: String,
    pub size: usize,
}

impl ClusterData {
    /// Build a cluster from its members, largest absolute amount first
    ///
    /// The notes label is assigned later, once all clusters are ordered.
    pub fn from_members(status: ClusterStatus, mut records: Vec<TransactionRecord>) -> Self {
        records.sort_by_key(|r| std::cmp::Reverse(r.amount_cents.abs()));
        let amount = records.iter().map(|r| r.amount_cents).sum();
        let (pivot_id, pivot_type) = records
            .first()
            .map(|r| (r.id.clone(), r.source))
            .unwrap_or_else(|| (String::new(), RecordSource::Payout));
        let size = records.len();
        Self {
            pivot_id,
            pivot_type,
            records,
            amount,
            status,
            notes: String::new(),
            size,
        }
    }
}

/// Per-job matching knobs supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSettings {
    /// Maximum absolute amount difference still considered equal, in cents
    pub amount_tolerance_cents: i64,
    /// Width of the acceptance window for timestamp distance
    pub time_window_hours: f64,
    /// Minimum reference similarity (0-100) for the fuzzy pass
    pub fuzzy_threshold: u8,
    /// Combined row cap enforced at the service boundary
    pub max_rows: usize,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            amount_tolerance_cents: 100,
            time_window_hours: 72.0,
            fuzzy_threshold: 85,
            max_rows: 10_000,
        }
    }
}

/// Everything one reconciliation run produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationOutcome {
    pub matches: Vec<MatchResult>,
    pub clusters: Vec<ClusterData>,
    pub unmatched_payouts: Vec<TransactionRecord>,
    pub unmatched_ledger: Vec<TransactionRecord>,
    /// Corrected cash-impact total; fee/failed/reversed artifacts excluded
    pub total_unmatched_amount_cents: i64,
    pub matched_count: usize,
    pub unmatched_count: usize,
    /// Matched payouts over total payouts, 0 when there are no payouts
    pub match_rate: f64,
}

impl ReconciliationOutcome {
    /// Flatten clusters into the evidence rows the narrative collaborator
    /// reads
    pub fn cluster_evidence(&self) -> Vec<ClusterEvidence> {
        self.clusters
            .iter()
            .map(|cluster| ClusterEvidence {
                label: cluster.notes.clone(),
                status: cluster.status,
                pivot_id: cluster.pivot_id.clone(),
                amount_cents: cluster.amount,
                size: cluster.size,
                members: cluster
                    .records
                    .iter()
                    .map(|record| EvidenceLine {
                        record_id: record.id.clone(),
                        source: record.source,
                        amount_cents: record.amount_cents,
                        reference: record.reference.clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}

/// One cluster flattened for narrative generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterEvidence {
    pub label: String,
    pub status: ClusterStatus,
    pub pivot_id: String,
    pub amount_cents: i64,
    pub size: usize,
    pub members: Vec<EvidenceLine>,
}

/// One record inside an evidence row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceLine {
    pub record_id: String,
    pub source: RecordSource,
    pub amount_cents: i64,
    pub reference: Option<String>,
}

/// A persisted reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Identifier assigned when the job ran
    pub job_id: Uuid,
    /// Settings the run used
    pub settings: JobSettings,
    pub outcome: ReconciliationOutcome,
    /// When the run finished
    pub created_at: NaiveDateTime,
}

/// Errors that can occur at the reconciliation boundary
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unknown payout status: {0}")]
    UnknownStatus(String),
    #[error("Unknown ledger entry type: {0}")]
    UnknownEntryKind(String),
    #[error("Job not found: {0}")]
    JobNotFound(String),
    #[error("Export error: {0}")]
    Export(String),
}

/// Result type for reconciliation operations
pub type ReconResult<T> = Result<T, ReconError>;
