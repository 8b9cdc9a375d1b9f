use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::models::import::ImportReport;
use crate::models::job::{ImportJob, ImportStatus};
use crate::models::response::ApiResponse;
use crate::services::import;
use crate::services::worker::ImportTask;

/// Body returned when an async import is accepted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AsyncImportAccepted {
    pub job_id: Uuid,
    pub status: ImportStatus,
}

/// Job snapshot returned by the status endpoint.
#[derive(Debug, Serialize)]
pub struct JobStatusBody {
    #[serde(flatten)]
    pub job: ImportJob,
    pub progress: f64,
}

impl From<ImportJob> for JobStatusBody {
    fn from(job: ImportJob) -> Self {
        let progress = job.progress();
        Self { job, progress }
    }
}

/// POST /api/v1/books/bulk — synchronous CSV import. Blocks until every row
/// has been processed and returns the full report.
pub async fn bulk_import(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ImportReport>>), AppError> {
    let (filename, data) = read_csv_upload(multipart).await?;
    info!(filename = %filename, "Request to bulk import books");

    let rows = import::parse_csv(&data)?;
    let report = import::run_import(&state.catalog, &rows).await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(report, "Bulk import completed")),
    ))
}

/// POST /api/v1/books/bulk-async — register a job, enqueue the work, return
/// the job id immediately. Progress is observable via the status endpoint.
pub async fn bulk_import_async(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<AsyncImportAccepted>>), AppError> {
    let (filename, data) = read_csv_upload(multipart).await?;
    info!(filename = %filename, "Request to async bulk import books");

    let rows = import::parse_csv(&data)?;
    let job_id = state.jobs.create_job(rows.total_data_rows());
    state.importer.submit(ImportTask { job_id, rows })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(
            AsyncImportAccepted {
                job_id,
                status: ImportStatus::Pending,
            },
            "Import started. Use job ID to check progress.",
        )),
    ))
}

/// GET /api/v1/books/bulk/status/{job_id} — poll an async import job.
pub async fn import_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiResponse<JobStatusBody>>, AppError> {
    let job = state
        .jobs
        .get_job(&job_id)
        .ok_or_else(|| AppError::not_found("Import job", job_id))?;

    Ok(Json(ApiResponse::success(
        JobStatusBody::from(job),
        "Job status retrieved",
    )))
}

/// Pull the `file` part out of the multipart body and apply the upload
/// guards: a present, non-empty file with a .csv name.
async fn read_csv_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::file_processing(format!("Failed to read upload: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("upload.csv").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::file_processing(format!("Failed to read upload: {e}")))?;
            upload = Some((filename, data.to_vec()));
        }
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::file_processing("Missing 'file' field in upload"))?;

    if data.is_empty() {
        return Err(AppError::FileProcessing {
            message: "File is empty".to_string(),
            code: "EMPTY_FILE",
        });
    }

    if !filename.to_lowercase().ends_with(".csv") {
        return Err(AppError::FileProcessing {
            message: "Only CSV files are supported".to_string(),
            code: "INVALID_FILE_TYPE",
        });
    }

    Ok((filename, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_body_includes_progress() {
        let mut job = ImportJob::new(Uuid::new_v4(), 4);
        job.processed_rows = 1;
        let body = JobStatusBody::from(job);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["progress"], 25.0);
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["totalRows"], 4);
    }
}
