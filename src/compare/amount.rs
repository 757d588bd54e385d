//! Sign/status-aware amount comparison

use crate::types::{EntryKind, PayoutStatus, TransactionRecord};

/// Decides whether a payout and a ledger candidate agree on money, and how
/// closely
///
/// A successful payout is mirrored in the ledger as a negative debit, so the
/// two amounts must cancel out; a reversed payout is matched against the
/// positive credit that returned the money. Failed payouts moved no money and
/// never match on amount.
#[derive(Debug, Clone, Copy)]
pub struct AmountComparator {
    tolerance_cents: i64,
}

impl AmountComparator {
    /// Create a comparator with the given tolerance in minor units
    pub fn new(tolerance_cents: i64) -> Self {
        Self { tolerance_cents }
    }

    /// Whether the pair is amount-eligible under the tolerance
    pub fn eligible(&self, payout: &TransactionRecord, ledger: &TransactionRecord) -> bool {
        self.difference(payout, ledger).is_some()
    }

    /// Graded score in `[0, 1]`, or 0 when the pair is not eligible
    ///
    /// A zero tolerance means exact-only: score 1 on an exact hit, 0
    /// otherwise.
    pub fn score(&self, payout: &TransactionRecord, ledger: &TransactionRecord) -> f64 {
        match self.difference(payout, ledger) {
            Some(0) => 1.0,
            Some(diff) if self.tolerance_cents > 0 => {
                (1.0 - diff as f64 / self.tolerance_cents as f64).max(0.0)
            }
            _ => 0.0,
        }
    }

    /// Absolute amount difference when the pair is eligible, `None` otherwise
    fn difference(&self, payout: &TransactionRecord, ledger: &TransactionRecord) -> Option<i64> {
        let diff = match payout.status {
            // No money moved, nothing can mirror it.
            Some(PayoutStatus::Failed) => return None,
            // The ledger records the outflow as a negative mirror.
            Some(PayoutStatus::Success) => {
                if ledger.kind != Some(EntryKind::Debit) || ledger.amount_cents >= 0 {
                    return None;
                }
                (payout.amount_cents + ledger.amount_cents).abs()
            }
            // The returned money shows up as a positive credit.
            Some(PayoutStatus::Reversed) => {
                if ledger.kind != Some(EntryKind::Credit) || ledger.amount_cents <= 0 {
                    return None;
                }
                (payout.amount_cents - ledger.amount_cents).abs()
            }
            None => (payout.amount_cents - ledger.amount_cents).abs(),
        };

        (diff <= self.tolerance_cents).then_some(diff)
    }
}
