use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::import::RowError;

/// Status of a bulk import job.
///
/// Pending -> Processing -> Completed | Failed. No cancellation or retry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ImportStatus {
    /// Completed and Failed jobs never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, ImportStatus::Completed | ImportStatus::Failed)
    }
}

/// Progress record of an async bulk import, owned by the job tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    pub job_id: Uuid,
    pub status: ImportStatus,
    pub total_rows: usize,
    pub processed_rows: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<RowError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl ImportJob {
    pub fn new(job_id: Uuid, total_rows: usize) -> Self {
        Self {
            job_id,
            status: ImportStatus::Pending,
            total_rows,
            processed_rows: 0,
            success_count: 0,
            failure_count: 0,
            errors: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Percentage of rows processed so far (0.0 - 100.0).
    pub fn progress(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        (self.processed_rows as f64 * 100.0) / self.total_rows as f64
    }
}
