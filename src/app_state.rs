use sqlx::PgPool;
use std::sync::Arc;

use crate::services::catalog::CatalogService;
use crate::services::jobs::JobTracker;
use crate::services::worker::ImportWorkerPool;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub catalog: Arc<CatalogService>,
    pub jobs: Arc<JobTracker>,
    pub importer: Arc<ImportWorkerPool>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        catalog: Arc<CatalogService>,
        jobs: Arc<JobTracker>,
        importer: ImportWorkerPool,
    ) -> Self {
        Self {
            db,
            catalog,
            jobs,
            importer: Arc::new(importer),
        }
    }
}
