//! The four-pass matching engine

use std::collections::HashMap;

use tracing::debug;

use crate::compare::{hour_distance, token_sort_ratio, AmountComparator};
use crate::matching::state::MatchState;
use crate::types::{JobSettings, MatchResult, MatchType, ScoreBreakdown, TransactionRecord};

/// Minimum weighted score for the exact-reference and deterministic passes
const DETERMINISTIC_ACCEPT: f64 = 0.5;
/// Minimum weighted score for the fuzzy pass
const FUZZY_ACCEPT: f64 = 0.4;

/// Deterministic four-pass matcher over a payout list and a ledger list
///
/// Passes run in order of decreasing strictness: exact transaction id, exact
/// reference, weighted deterministic scoring, then fuzzy reference
/// similarity. Every pass only considers records no earlier pass claimed, and
/// within a pass a payout is matched to at most one ledger entry.
pub struct MatchingEngine {
    settings: JobSettings,
    amounts: AmountComparator,
}

impl MatchingEngine {
    /// Create an engine for one job's settings
    pub fn new(settings: JobSettings) -> Self {
        let amounts = AmountComparator::new(settings.amount_tolerance_cents);
        Self { settings, amounts }
    }

    /// Run all four passes and return the accepted matches
    pub fn run(
        &self,
        payouts: &[TransactionRecord],
        ledger: &[TransactionRecord],
    ) -> Vec<MatchResult> {
        let mut state = MatchState::new();

        state = self.exact_id_pass(payouts, ledger, state);
        debug!(matches = state.len(), "exact-id pass complete");

        state = self.exact_reference_pass(payouts, ledger, state);
        debug!(matches = state.len(), "exact-reference pass complete");

        state = self.deterministic_pass(payouts, ledger, state);
        debug!(matches = state.len(), "deterministic pass complete");

        state = self.fuzzy_pass(payouts, ledger, state);
        debug!(matches = state.len(), "fuzzy pass complete");

        state.into_results()
    }

    /// Pass 1: identical external transaction ids
    ///
    /// A tx_id hit is authoritative: the match is recorded even when the
    /// amount comparator disagrees, with the amount component scored 0.
    fn exact_id_pass(
        &self,
        payouts: &[TransactionRecord],
        ledger: &[TransactionRecord],
        mut state: MatchState,
    ) -> MatchState {
        let by_tx_id = index_by(ledger, |record| record.tx_id.as_deref());

        for payout in payouts {
            if state.is_payout_matched(&payout.id) {
                continue;
            }
            let Some(tx_id) = non_empty(payout.tx_id.as_deref()) else {
                continue;
            };
            let Some(candidates) = by_tx_id.get(tx_id) else {
                continue;
            };
            let Some(entry) = candidates
                .iter()
                .find(|entry| !state.is_ledger_matched(&entry.id))
            else {
                continue;
            };

            let amount_agrees = if self.amounts.eligible(payout, entry) {
                1.0
            } else {
                0.0
            };
            let breakdown = ScoreBreakdown::new(1.0, amount_agrees, 1.0, 1.0);
            state.record(MatchResult::from_breakdown(
                &payout.id,
                &entry.id,
                breakdown,
                MatchType::Exact,
            ));
        }

        state
    }

    /// Pass 2: identical reference strings, amount-eligible only
    ///
    /// Stricter than the scan passes about time: an unknown hour distance
    /// scores 0 here rather than neutral.
    fn exact_reference_pass(
        &self,
        payouts: &[TransactionRecord],
        ledger: &[TransactionRecord],
        mut state: MatchState,
    ) -> MatchState {
        let by_reference = index_by(ledger, |record| record.reference.as_deref());

        for payout in payouts {
            if state.is_payout_matched(&payout.id) || payout.is_failed() {
                continue;
            }
            let Some(reference) = non_empty(payout.reference.as_deref()) else {
                continue;
            };
            let Some(candidates) = by_reference.get(reference) else {
                continue;
            };

            for entry in candidates {
                if state.is_ledger_matched(&entry.id) || !self.amounts.eligible(payout, entry) {
                    continue;
                }

                let hours = hour_distance(payout.timestamp.as_deref(), entry.timestamp.as_deref());
                let time_score = match hours {
                    Some(h) if h <= self.settings.time_window_hours => 1.0,
                    _ => 0.0,
                };
                let fuzzy_score =
                    token_sort_ratio(reference, entry.reference_str()) as f64 / 100.0;
                let breakdown = ScoreBreakdown::new(
                    1.0,
                    self.amounts.score(payout, entry),
                    time_score,
                    fuzzy_score,
                );

                if breakdown.weighted_score() >= DETERMINISTIC_ACCEPT {
                    state.record(MatchResult::from_breakdown(
                        &payout.id,
                        &entry.id,
                        breakdown,
                        MatchType::Exact,
                    ));
                    break;
                }
            }
        }

        state
    }

    /// Pass 3: weighted amount/time/reference scoring over all candidates
    fn deterministic_pass(
        &self,
        payouts: &[TransactionRecord],
        ledger: &[TransactionRecord],
        mut state: MatchState,
    ) -> MatchState {
        self.scan_pass(payouts, ledger, &mut state, None);
        state
    }

    /// Pass 4: same scan, but reference similarity must clear the threshold
    fn fuzzy_pass(
        &self,
        payouts: &[TransactionRecord],
        ledger: &[TransactionRecord],
        mut state: MatchState,
    ) -> MatchState {
        let min_fuzzy = self.settings.fuzzy_threshold as f64 / 100.0;
        self.scan_pass(payouts, ledger, &mut state, Some(min_fuzzy));
        state
    }

    /// Shared candidate scan for the deterministic and fuzzy passes
    ///
    /// With `min_fuzzy` unset this is the deterministic pass (accept at 0.5);
    /// with it set, candidates below the similarity floor are skipped and the
    /// acceptance bar drops to 0.4.
    fn scan_pass(
        &self,
        payouts: &[TransactionRecord],
        ledger: &[TransactionRecord],
        state: &mut MatchState,
        min_fuzzy: Option<f64>,
    ) {
        let (accept, match_type) = match min_fuzzy {
            None => (DETERMINISTIC_ACCEPT, MatchType::Deterministic),
            Some(_) => (FUZZY_ACCEPT, MatchType::Fuzzy),
        };

        for payout in payouts {
            if state.is_payout_matched(&payout.id) || payout.is_failed() {
                continue;
            }

            let mut best: Option<(f64, &TransactionRecord, ScoreBreakdown)> = None;
            for entry in ledger {
                if state.is_ledger_matched(&entry.id) || !self.amounts.eligible(payout, entry) {
                    continue;
                }

                let hours = hour_distance(payout.timestamp.as_deref(), entry.timestamp.as_deref());
                // An unknown distance passes the window with a neutral score.
                let time_score = match hours {
                    Some(h) => {
                        if h > self.settings.time_window_hours {
                            continue;
                        }
                        if self.settings.time_window_hours > 0.0 {
                            (1.0 - h / self.settings.time_window_hours).max(0.0)
                        } else {
                            1.0
                        }
                    }
                    None => 0.5,
                };

                let fuzzy_score =
                    token_sort_ratio(payout.reference_str(), entry.reference_str()) as f64 / 100.0;
                if let Some(min) = min_fuzzy {
                    if fuzzy_score < min {
                        continue;
                    }
                }

                let breakdown = ScoreBreakdown::new(
                    0.0,
                    self.amounts.score(payout, entry),
                    time_score,
                    fuzzy_score,
                );
                let score = breakdown.weighted_score();
                // Strictly better only; the first candidate wins ties.
                if best.as_ref().is_none_or(|(top, _, _)| score > *top) {
                    best = Some((score, entry, breakdown));
                }
            }

            if let Some((score, entry, breakdown)) = best {
                if score >= accept {
                    state.record(MatchResult::from_breakdown(
                        &payout.id,
                        &entry.id,
                        breakdown,
                        match_type,
                    ));
                }
            }
        }
    }
}

/// Index ledger entries by a non-empty key, preserving input order per key
fn index_by<'a>(
    ledger: &'a [TransactionRecord],
    key: impl Fn(&'a TransactionRecord) -> Option<&'a str>,
) -> HashMap<&'a str, Vec<&'a TransactionRecord>> {
    let mut index: HashMap<&str, Vec<&TransactionRecord>> = HashMap::new();
    for record in ledger {
        if let Some(value) = non_empty(key(record)) {
            index.entry(value).or_default().push(record);
        }
    }
    index
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
