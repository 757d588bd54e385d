//! Basic reconciliation usage example

use reconciliation_core::utils::MemoryResultStore;
use reconciliation_core::{
    EntryKind, JobSettings, JsonExporter, OutcomeExporter, PayoutStatus, ReconciliationService,
    TransactionRecord,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔄 Reconciliation Core - Basic Example\n");

    // 1. Build the two input lists as an upstream parser would
    println!("📥 Preparing transaction lists...");
    let payouts = vec![
        TransactionRecord::payout("po-001", 125_000, "USD")
            .with_status(PayoutStatus::Success)
            .with_tx_id("TX-9001")
            .with_reference("TXN-9001")
            .with_timestamp("2024-03-01T09:00:00Z"),
        TransactionRecord::payout("po-002", 48_000, "USD")
            .with_status(PayoutStatus::Success)
            .with_reference("INV-2024-17")
            .with_timestamp("2024-03-02T14:00:00Z"),
        TransactionRecord::payout("po-003", 15_000, "USD").with_status(PayoutStatus::Failed),
        TransactionRecord::payout("po-004", 230_000, "USD").with_status(PayoutStatus::Success),
    ];

    let ledger = vec![
        TransactionRecord::ledger_entry("le-001", -125_000, "USD")
            .with_kind(EntryKind::Debit)
            .with_tx_id("TX-9001")
            .with_timestamp("2024-03-01T09:45:00Z"),
        TransactionRecord::ledger_entry("le-002", -48_020, "USD")
            .with_kind(EntryKind::Debit)
            .with_reference("INV-2024-17")
            .with_timestamp("2024-03-02T16:30:00Z"),
        // A provider fee riding on the first payout.
        TransactionRecord::ledger_entry("le-003", -1_900, "USD").with_reference("TXN-9001"),
    ];
    println!(
        "  ✓ {} payouts, {} ledger entries\n",
        payouts.len(),
        ledger.len()
    );

    // 2. Run a job through the storage-backed service
    println!("⚙️  Running reconciliation...");
    let settings = JobSettings {
        amount_tolerance_cents: 100,
        time_window_hours: 48.0,
        ..JobSettings::default()
    };
    let mut service = ReconciliationService::new(MemoryResultStore::new());
    let report = service.run_job(payouts, ledger, settings).await?;

    let outcome = &report.outcome;
    println!(
        "  ✓ Matched {} of {} payouts ({:.0}% match rate)\n",
        outcome.matched_count,
        outcome.matched_count + outcome.unmatched_payouts.len(),
        outcome.match_rate * 100.0
    );

    // 3. Show the matches with their score breakdowns
    println!("🔗 Matches:");
    for result in &outcome.matches {
        println!(
            "  {} ↔ {} [{:?}] score {:.2} ({:?})",
            result.payout_id,
            result.ledger_id,
            result.match_type,
            result.score,
            result.confidence_level
        );
    }
    println!();

    // 4. Explain what is left
    println!("🧩 Exception clusters:");
    for cluster in &outcome.clusters {
        println!(
            "  {}: pivot {} ({}), {} cents",
            cluster.notes,
            cluster.pivot_id,
            cluster.pivot_type.as_str(),
            cluster.amount
        );
    }
    println!(
        "\n💰 Genuine unmatched amount: {} cents",
        outcome.total_unmatched_amount_cents
    );

    // 5. Export the stored report as JSON
    let exported = JsonExporter.export(&report)?;
    println!(
        "\n📤 Exported report {} ({} bytes of {})",
        report.job_id,
        exported.len(),
        JsonExporter.content_type()
    );

    Ok(())
}
