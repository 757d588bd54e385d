//! Ordered classification rules for unmatched records
//!
//! Each rule drains the records it recognizes from a working set; the first
//! rule to claim a record wins. The rules consult matched transactions to
//! tell fees and reversal residue apart from genuine discrepancies.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::types::{
    ClusterData, ClusterStatus, EntryKind, PayoutStatus, RecordSource, TransactionRecord,
};

/// Reference prefix marking records that are known internal noise
pub const NOISE_PREFIX: &str = "NOISE-";
/// Reference prefix carried by provider transaction groups
pub const REFERENCE_PREFIX: &str = "TXN-";

/// What the classifier knows about the matched side of the run
///
/// Lookup is by reference: the absolute amount of the first matched
/// transaction carrying it (payouts take precedence over ledger entries),
/// and whether a matched reversed payout carries it.
#[derive(Debug, Default)]
pub struct MatchedContext {
    amounts_by_reference: HashMap<String, i64>,
    reversed_references: HashSet<String>,
}

impl MatchedContext {
    /// Build the context from matched records, payouts first
    pub fn new(matched: &[TransactionRecord]) -> Self {
        let mut context = Self::default();
        for record in matched {
            let Some(reference) = record.reference.as_deref().filter(|r| !r.is_empty()) else {
                continue;
            };
            context
                .amounts_by_reference
                .entry(reference.to_string())
                .or_insert_with(|| record.amount_cents.abs());
            if record.source == RecordSource::Payout
                && record.status == Some(PayoutStatus::Reversed)
            {
                context.reversed_references.insert(reference.to_string());
            }
        }
        context
    }

    /// Absolute amount of the matched transaction carrying this reference
    pub fn matched_amount(&self, reference: &str) -> Option<i64> {
        self.amounts_by_reference.get(reference).copied()
    }

    /// Whether a matched payout with this reference was reversed
    pub fn has_reversed_payout(&self, reference: &str) -> bool {
        self.reversed_references.contains(reference)
    }
}

/// Rule 1: failed payouts form one cluster with no cash impact
pub(crate) fn failed_payout_rule(pending: &mut Vec<TransactionRecord>) -> Option<ClusterData> {
    let failed = drain_where(pending, |record| {
        record.source == RecordSource::Payout && record.is_failed()
    });
    (!failed.is_empty()).then(|| ClusterData::from_members(ClusterStatus::Failed, failed))
}

/// Rule 2: known internal noise, grouped but kept as real cash impact
pub(crate) fn noise_rule(pending: &mut Vec<TransactionRecord>) -> Option<ClusterData> {
    let noise = drain_where(pending, |record| {
        record.reference_str().starts_with(NOISE_PREFIX)
    });
    (!noise.is_empty()).then(|| ClusterData::from_members(ClusterStatus::Unmatched, noise))
}

/// Rule 3: group provider-referenced records and classify each group
pub(crate) fn reference_group_rules(
    pending: &mut Vec<TransactionRecord>,
    context: &MatchedContext,
) -> Vec<ClusterData> {
    let grouped = drain_where(pending, |record| {
        record.reference_str().starts_with(REFERENCE_PREFIX)
    });

    // BTreeMap keeps group order stable across runs.
    let mut groups: BTreeMap<String, Vec<TransactionRecord>> = BTreeMap::new();
    for record in grouped {
        groups
            .entry(record.reference_str().to_string())
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .map(|(reference, members)| classify_reference_group(&reference, members, context))
        .collect()
}

/// Rule 4: per-record fallback for everything the earlier rules passed over
pub(crate) fn remainder_rule(
    pending: &mut Vec<TransactionRecord>,
    context: &MatchedContext,
) -> Vec<ClusterData> {
    pending
        .drain(..)
        .map(|record| {
            let status = if rides_on_matched_transaction(&record, context) {
                ClusterStatus::Fee
            } else {
                ClusterStatus::Unmatched
            };
            ClusterData::from_members(status, vec![record])
        })
        .collect()
}

fn classify_reference_group(
    reference: &str,
    mut members: Vec<TransactionRecord>,
    context: &MatchedContext,
) -> ClusterData {
    members.sort_by_key(|record| Reverse(record.amount_cents.abs()));
    let main_amount = members[0].amount_cents.abs();
    let matched_amount = context.matched_amount(reference);
    // The matched transaction is the comparison base when the reference is
    // known; otherwise the group's own largest member stands in.
    let base = matched_amount.unwrap_or(main_amount);

    let status = if members.len() > 1
        && members[1..]
            .iter()
            .all(|record| is_fee_sized(record.amount_cents, base))
    {
        ClusterStatus::Fee
    } else if members.len() == 1
        && matched_amount.is_some_and(|matched| members[0].amount_cents.abs() * 20 < matched)
    {
        ClusterStatus::Fee
    } else if members.len() == 1 && is_reversal_residue(&members[0], reference, context) {
        ClusterStatus::Reversed
    } else if members.len() > 1 {
        ClusterStatus::Partial
    } else {
        ClusterStatus::Unmatched
    };

    ClusterData::from_members(status, members)
}

/// Between 0.1% and 5% of the comparison base, inclusive
fn is_fee_sized(amount_cents: i64, base: i64) -> bool {
    let amount = amount_cents.abs();
    amount * 1000 >= base && amount * 20 <= base
}

/// A leftover ledger debit whose payout came back
fn is_reversal_residue(
    record: &TransactionRecord,
    reference: &str,
    context: &MatchedContext,
) -> bool {
    record.source == RecordSource::Ledger
        && record.kind == Some(EntryKind::Debit)
        && record.amount_cents < 0
        && context.has_reversed_payout(reference)
}

/// Under 5% of a matched transaction sharing the record's reference
fn rides_on_matched_transaction(record: &TransactionRecord, context: &MatchedContext) -> bool {
    let reference = record.reference_str();
    if reference.is_empty() {
        return false;
    }
    context
        .matched_amount(reference)
        .is_some_and(|matched| record.amount_cents.abs() * 20 < matched)
}

/// Stable partition: take everything the predicate claims, keep the rest
fn drain_where(
    pending: &mut Vec<TransactionRecord>,
    predicate: impl Fn(&TransactionRecord) -> bool,
) -> Vec<TransactionRecord> {
    let (taken, kept) = std::mem::take(pending).into_iter().partition(&predicate);
    *pending = kept;
    taken
}
