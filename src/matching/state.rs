//! Match bookkeeping threaded through the passes

use std::collections::HashSet;

use crate::types::MatchResult;

/// Which records have been claimed so far, plus the accumulated results
///
/// Each pass takes the state by value and returns it, so the engine stays a
/// pure function of its inputs and individual passes can be unit-tested with
/// a pre-seeded state.
#[derive(Debug, Default)]
pub struct MatchState {
    matched_payouts: HashSet<String>,
    matched_ledger: HashSet<String>,
    results: Vec<MatchResult>,
}

impl MatchState {
    /// Empty state for a fresh run
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a payout id has been claimed by an earlier pass
    pub fn is_payout_matched(&self, payout_id: &str) -> bool {
        self.matched_payouts.contains(payout_id)
    }

    /// Whether a ledger id has been claimed by an earlier pass
    pub fn is_ledger_matched(&self, ledger_id: &str) -> bool {
        self.matched_ledger.contains(ledger_id)
    }

    /// Record an accepted match, claiming both ids
    pub fn record(&mut self, result: MatchResult) {
        debug_assert!(!self.matched_payouts.contains(&result.payout_id));
        debug_assert!(!self.matched_ledger.contains(&result.ledger_id));
        self.matched_payouts.insert(result.payout_id.clone());
        self.matched_ledger.insert(result.ledger_id.clone());
        self.results.push(result);
    }

    /// Results accumulated so far
    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    /// Number of matches accumulated so far
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether any match has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Consume the state, yielding the final result list
    pub fn into_results(self) -> Vec<MatchResult> {
        self.results
    }
}
