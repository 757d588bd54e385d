//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::traits::ResultStore;
use crate::types::{ReconError, ReconResult, ReconciliationReport};

/// In-memory result store for testing and development
#[derive(Debug, Clone, Default)]
pub struct MemoryResultStore {
    reports: Arc<RwLock<HashMap<Uuid, ReconciliationReport>>>,
}

impl MemoryResultStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.reports.write().unwrap().clear();
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn save_report(&mut self, report: &ReconciliationReport) -> ReconResult<()> {
        self.reports
            .write()
            .unwrap()
            .insert(report.job_id, report.clone());
        Ok(())
    }

    async fn get_report(&self, job_id: Uuid) -> ReconResult<Option<ReconciliationReport>> {
        Ok(self.reports.read().unwrap().get(&job_id).cloned())
    }

    async fn list_reports(&self) -> ReconResult<Vec<ReconciliationReport>> {
        let reports = self.reports.read().unwrap();
        let mut listed: Vec<ReconciliationReport> = reports.values().cloned().collect();
        // HashMap order is arbitrary; keep listings stable for callers.
        listed.sort_by_key(|report| report.created_at);
        Ok(listed)
    }

    async fn delete_report(&mut self, job_id: Uuid) -> ReconResult<()> {
        if self.reports.write().unwrap().remove(&job_id).is_some() {
            Ok(())
        } else {
            Err(ReconError::JobNotFound(job_id.to_string()))
        }
    }
}
