//! In-process import job tracker.
//!
//! A concurrent map from job id to job record, shared between request
//! handlers (polling) and the import workers (progress writes). Updates are
//! whole-record replaces, last writer wins; readers may see a stale snapshot
//! but never a torn one. Terminal jobs are evicted after a TTL so the map
//! cannot grow without bound.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::job::{ImportJob, ImportStatus};

pub struct JobTracker {
    jobs: DashMap<Uuid, ImportJob>,
    /// How long Completed/Failed jobs remain visible to polling.
    ttl: Duration,
}

impl JobTracker {
    pub fn new(ttl: Duration) -> Self {
        Self {
            jobs: DashMap::new(),
            ttl,
        }
    }

    /// Register a new Pending job and return its identifier.
    pub fn create_job(&self, total_rows: usize) -> Uuid {
        let job_id = Uuid::new_v4();
        self.jobs.insert(job_id, ImportJob::new(job_id, total_rows));
        info!(%job_id, total_rows, "Import job created");
        job_id
    }

    pub fn get_job(&self, job_id: &Uuid) -> Option<ImportJob> {
        self.jobs.get(job_id).map(|entry| entry.value().clone())
    }

    /// Replace the stored record for this job id (last-writer-wins).
    pub fn update_job(&self, job: ImportJob) {
        self.jobs.insert(job.job_id, job);
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Drop terminal jobs whose `finished_at` is older than the TTL.
    /// In-flight jobs are never touched. Returns the number evicted.
    pub fn evict_expired(&self) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::hours(1));
        let before = self.jobs.len();
        self.jobs.retain(|_, job| {
            !(job.status.is_terminal()
                && job.finished_at.map(|t| t < cutoff).unwrap_or(false))
        });
        let evicted = before - self.jobs.len();
        if evicted > 0 {
            debug!(evicted, "Evicted expired import jobs");
        }
        evicted
    }

    /// Periodic eviction loop, spawned once at startup.
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let tracker = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                tracker.evict_expired();
            }
        })
    }
}
