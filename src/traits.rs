//! Traits for collaborator seams and extensibility

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::{ReconError, ReconResult, ReconciliationReport, TransactionRecord};

/// Persistence seam for finished reconciliation runs
///
/// The engine itself never persists anything; this trait is how callers plug
/// in a database (PostgreSQL, SQLite, in-memory, etc.) behind the service.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Save a finished report
    async fn save_report(&mut self, report: &ReconciliationReport) -> ReconResult<()>;

    /// Get a report by job id
    async fn get_report(&self, job_id: Uuid) -> ReconResult<Option<ReconciliationReport>>;

    /// List all saved reports
    async fn list_reports(&self) -> ReconResult<Vec<ReconciliationReport>>;

    /// Delete a report
    async fn delete_report(&mut self, job_id: Uuid) -> ReconResult<()>;
}

/// Export seam turning a report into a downloadable document
///
/// PDF and CSV renderers live outside this crate; the JSON form ships here
/// because the result types already know how to serialize themselves.
pub trait OutcomeExporter: Send + Sync {
    /// MIME type of the produced document
    fn content_type(&self) -> &'static str;

    /// Render the report to bytes
    fn export(&self, report: &ReconciliationReport) -> ReconResult<Vec<u8>>;
}

/// JSON exporter over the report's serde representation
pub struct JsonExporter;

impl OutcomeExporter for JsonExporter {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn export(&self, report: &ReconciliationReport) -> ReconResult<Vec<u8>> {
        serde_json::to_vec_pretty(report).map_err(|e| ReconError::Export(e.to_string()))
    }
}

/// Trait for implementing custom record validation rules
pub trait RecordValidator: Send + Sync {
    /// Validate a single record before reconciliation
    fn validate_record(&self, record: &TransactionRecord) -> ReconResult<()>;

    /// Validate a whole input list, stopping at the first offender
    fn validate_batch(&self, records: &[TransactionRecord]) -> ReconResult<()> {
        for record in records {
            self.validate_record(record)?;
        }
        Ok(())
    }
}

/// Default record validator with basic rules
pub struct DefaultRecordValidator;

impl RecordValidator for DefaultRecordValidator {
    fn validate_record(&self, record: &TransactionRecord) -> ReconResult<()> {
        if record.id.trim().is_empty() {
            return Err(ReconError::Validation(
                "Record ID cannot be empty".to_string(),
            ));
        }

        if record.currency.trim().is_empty() {
            return Err(ReconError::Validation(format!(
                "Record '{}' has no currency",
                record.id
            )));
        }

        Ok(())
    }
}
