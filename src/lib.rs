//! # Reconciliation Core
//!
//! A deterministic engine for reconciling an outbound-payment list against an
//! internal bookkeeping list: it finds corresponding entries, scores the
//! confidence of each correspondence, and explains what remains unmatched.
//!
//! ## Features
//!
//! - **Four-pass matching**: exact transaction id, exact reference, weighted
//!   deterministic scoring, and fuzzy reference similarity
//! - **Sign/status-aware amounts**: successful payouts match their negative
//!   debit mirrors, reversals match the returning credit, failed payouts
//!   match nothing
//! - **Exception clustering**: leftover records are classified into failed,
//!   fee, reversal, partial, and genuinely unmatched groups
//! - **Corrected totals**: the reported unmatched amount excludes artifacts
//!   that need no investigation
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   result persistence and export
//!
//! ## Quick Start
//!
//! ```rust
//! use reconciliation_core::{
//!     EntryKind, JobSettings, PayoutStatus, ReconciliationEngine, TransactionRecord,
//! };
//!
//! let payouts = vec![TransactionRecord::payout("p1", 10_000, "USD")
//!     .with_status(PayoutStatus::Success)
//!     .with_tx_id("T1")];
//! let ledger = vec![TransactionRecord::ledger_entry("l1", -10_000, "USD")
//!     .with_kind(EntryKind::Debit)
//!     .with_tx_id("T1")];
//!
//! let outcome = ReconciliationEngine::new(JobSettings::default()).reconcile(&payouts, &ledger);
//! assert_eq!(outcome.matched_count, 1);
//! ```

pub mod cluster;
pub mod compare;
pub mod matching;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use cluster::*;
pub use compare::*;
pub use matching::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
