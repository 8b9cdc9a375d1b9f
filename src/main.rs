mod app_state;
mod config;
mod db;
mod error;
mod models;
mod routes;
mod services;
mod store;

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use db::PgBookStore;
use services::{catalog::CatalogService, jobs::JobTracker, worker::ImportWorkerPool};

/// CSV uploads larger than this are rejected before parsing.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// How often the job tracker drops expired terminal jobs.
const JOB_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing biblio-api server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!("books_created_total", "Total books created via the API");
    metrics::describe_counter!("import_jobs_total", "Total async import jobs submitted");
    metrics::describe_counter!("import_jobs_completed", "Total async import jobs completed");
    metrics::describe_counter!("import_jobs_failed", "Total async import jobs that failed");
    metrics::describe_histogram!(
        "import_processing_seconds",
        "Time to process a bulk import job"
    );

    // Initialize database connection pool
    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Catalog service over the Postgres store
    let catalog = Arc::new(CatalogService::new(Arc::new(PgBookStore::new(
        db_pool.clone(),
    ))));

    // Job tracker with TTL eviction of finished jobs
    let jobs = Arc::new(JobTracker::new(Duration::from_secs(config.job_ttl_secs)));
    Arc::clone(&jobs).spawn_sweeper(JOB_SWEEP_INTERVAL);

    // Bounded worker pool for async imports
    tracing::info!(
        workers = config.import_workers,
        queue_capacity = config.import_queue_capacity,
        "Starting import worker pool"
    );
    let importer = ImportWorkerPool::new(
        config.import_workers,
        config.import_queue_capacity,
        Arc::clone(&catalog),
        Arc::clone(&jobs),
    );

    // Create shared application state
    let state = AppState::new(db_pool, catalog, jobs, importer);

    // Build API routes
    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/api/v1/books",
            post(routes::books::create_book).get(routes::books::list_books),
        )
        .route("/api/v1/books/search", get(routes::books::search_books))
        .route("/api/v1/books/stats", get(routes::books::get_stats))
        .route("/api/v1/books/bulk", post(routes::import::bulk_import))
        .route(
            "/api/v1/books/bulk-async",
            post(routes::import::bulk_import_async),
        )
        .route(
            "/api/v1/books/bulk/status/{job_id}",
            get(routes::import::import_status),
        )
        .route(
            "/api/v1/books/{id}",
            get(routes::books::get_book)
                .put(routes::books::update_book)
                .delete(routes::books::delete_book),
        )
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES));

    tracing::info!("Starting biblio-api on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
