//! Bounded worker pool for asynchronous bulk imports.
//!
//! Submission pushes an [`ImportTask`] onto a bounded mpsc queue and returns
//! immediately; a fixed set of worker tasks drains the queue. Progress is
//! written into the [`JobTracker`] after every row and is observable only by
//! polling. There is no cancellation: a started import runs until it finishes
//! (Completed) or its task dies (Failed).

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::import::RowError;
use crate::models::job::{ImportJob, ImportStatus};
use crate::services::catalog::CatalogService;
use crate::services::import::{import_row, CsvRows};
use crate::services::jobs::JobTracker;

/// Pause every this many rows so a large import does not saturate the store.
const PACING_INTERVAL_ROWS: usize = 100;
const PACING_PAUSE_MS: u64 = 10;

/// A parsed upload waiting to be processed under a registered job id.
pub struct ImportTask {
    pub job_id: Uuid,
    pub rows: CsvRows,
}

pub struct ImportWorkerPool {
    sender: mpsc::Sender<ImportTask>,
}

impl ImportWorkerPool {
    /// Spawn `workers` tasks sharing a queue of `queue_capacity` entries.
    pub fn new(
        workers: usize,
        queue_capacity: usize,
        catalog: Arc<CatalogService>,
        tracker: Arc<JobTracker>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel::<ImportTask>(queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        for worker_id in 0..workers.max(1) {
            let receiver = Arc::clone(&receiver);
            let catalog = Arc::clone(&catalog);
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move {
                worker_loop(worker_id, receiver, catalog, tracker).await;
            });
        }

        Self { sender }
    }

    /// Enqueue a task without blocking. A full queue is an overload failure
    /// reported to the caller, not a wait.
    pub fn submit(&self, task: ImportTask) -> Result<(), AppError> {
        self.sender
            .try_send(task)
            .map_err(|_| AppError::ImportQueueFull)?;
        metrics::counter!("import_jobs_total").increment(1);
        Ok(())
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<ImportTask>>>,
    catalog: Arc<CatalogService>,
    tracker: Arc<JobTracker>,
) {
    loop {
        // Hold the lock only while waiting for the next task.
        let task = { receiver.lock().await.recv().await };
        let Some(task) = task else {
            info!(worker_id, "Import queue closed, worker exiting");
            break;
        };

        let job_id = task.job_id;
        info!(worker_id, %job_id, "Processing import job");
        let start = Instant::now();

        // Run the job in its own task so a panic is contained to this job:
        // the join error marks it Failed instead of killing the worker.
        let handle = tokio::spawn(process_job(
            Arc::clone(&catalog),
            Arc::clone(&tracker),
            task,
        ));

        match handle.await {
            Ok(()) => {
                metrics::counter!("import_jobs_completed").increment(1);
            }
            Err(e) => {
                error!(worker_id, %job_id, error = %e, "Import job task died");
                metrics::counter!("import_jobs_failed").increment(1);
                if let Some(mut job) = tracker.get_job(&job_id) {
                    job.status = ImportStatus::Failed;
                    job.finished_at = Some(Utc::now());
                    tracker.update_job(job);
                }
            }
        }

        metrics::histogram!("import_processing_seconds").record(start.elapsed().as_secs_f64());
    }
}

/// The async counterpart of `import::run_import`: same row semantics, plus a
/// tracker write after every row and periodic pacing.
async fn process_job(catalog: Arc<CatalogService>, tracker: Arc<JobTracker>, task: ImportTask) {
    let Some(mut job) = tracker.get_job(&task.job_id) else {
        warn!(job_id = %task.job_id, "Import task for unknown job, dropping");
        return;
    };

    job.status = ImportStatus::Processing;
    job.started_at = Some(Utc::now());
    tracker.update_job(job.clone());

    let mut errors: Vec<RowError> = Vec::new();
    let mut success_count = 0;

    for (index, row) in task.rows.rows.iter().enumerate().skip(task.rows.data_start) {
        let row_number = index + 1;
        match import_row(&catalog, row, row_number).await {
            Ok(_) => success_count += 1,
            Err(row_error) => errors.push(row_error),
        }

        let processed = index - task.rows.data_start + 1;
        job.processed_rows = processed;
        job.success_count = success_count;
        job.failure_count = errors.len();
        tracker.update_job(job.clone());

        if processed % PACING_INTERVAL_ROWS == 0 {
            sleep(Duration::from_millis(PACING_PAUSE_MS)).await;
        }
    }

    job.status = ImportStatus::Completed;
    job.finished_at = Some(Utc::now());
    job.errors = errors;
    tracker.update_job(job.clone());

    info!(
        job_id = %job.job_id,
        success = job.success_count,
        failed = job.failure_count,
        "Import job completed"
    );
}
