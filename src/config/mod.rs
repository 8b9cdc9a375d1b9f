use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Number of background import worker tasks
    #[serde(default = "default_import_workers")]
    pub import_workers: usize,

    /// Capacity of the pending-import queue; submissions beyond it are
    /// rejected with 503
    #[serde(default = "default_import_queue_capacity")]
    pub import_queue_capacity: usize,

    /// Seconds a finished import job stays queryable before eviction
    #[serde(default = "default_job_ttl_secs")]
    pub job_ttl_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_import_workers() -> usize {
    2
}

fn default_import_queue_capacity() -> usize {
    16
}

fn default_job_ttl_secs() -> u64 {
    3600
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
