use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::response::ApiResponse;
use crate::store::StoreError;

/// Error taxonomy for the whole service.
///
/// Raised at the point of detection and translated to an HTTP status plus a
/// wrapped error envelope in one place ([`IntoResponse`] below). Internal
/// detail is logged, never sent to the caller.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{resource} not found with id: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("{field} '{value}' already exists")]
    Duplicate { field: &'static str, value: String },

    #[error("{message}")]
    BusinessRule {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Validation failed")]
    Validation(garde::Report),

    #[error("{message}")]
    FileProcessing { message: String, code: &'static str },

    #[error("Import queue is full, try again later")]
    ImportQueueFull,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        AppError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: &'static str, value: impl Into<String>) -> Self {
        AppError::Duplicate {
            field,
            value: value.into(),
        }
    }

    pub fn business_rule(message: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        AppError::BusinessRule {
            message: message.into(),
            details,
        }
    }

    pub fn file_processing(message: impl Into<String>) -> Self {
        AppError::FileProcessing {
            message: message.into(),
            code: "FILE_PROCESSING_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Duplicate { .. } => StatusCode::CONFLICT,
            AppError::BusinessRule { .. }
            | AppError::Validation(_)
            | AppError::FileProcessing { .. } => StatusCode::BAD_REQUEST,
            AppError::ImportQueueFull => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "RESOURCE_NOT_FOUND",
            AppError::Duplicate { .. } => "DUPLICATE_RESOURCE",
            AppError::BusinessRule { .. } => "BUSINESS_LOGIC_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::FileProcessing { code, .. } => code,
            AppError::ImportQueueFull => "IMPORT_QUEUE_FULL",
            AppError::Store(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::BusinessRule { details, .. } => details.clone(),
            AppError::Validation(report) => {
                let fields: Vec<serde_json::Value> = report
                    .iter()
                    .map(|(path, error)| {
                        serde_json::json!({
                            "field": path.to_string(),
                            "message": error.to_string(),
                        })
                    })
                    .collect();
                Some(serde_json::Value::Array(fields))
            }
            _ => None,
        }
    }
}

impl From<garde::Report> for AppError {
    fn from(report: garde::Report) -> Self {
        AppError::Validation(report)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Store failures are internal: log the cause, return a generic message.
        let message = match &self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store operation failed");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body: ApiResponse<()> =
            ApiResponse::error_with_details(message, self.code(), self.details());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_taxonomy() {
        assert_eq!(AppError::not_found("Book", 7).code(), "RESOURCE_NOT_FOUND");
        assert_eq!(
            AppError::duplicate("ISBN", "978-0132350884").code(),
            "DUPLICATE_RESOURCE"
        );
        assert_eq!(
            AppError::business_rule("future date", None).code(),
            "BUSINESS_LOGIC_ERROR"
        );
        assert_eq!(
            AppError::file_processing("unreadable").code(),
            "FILE_PROCESSING_ERROR"
        );
    }

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(AppError::not_found("Book", 7).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::duplicate("ISBN", "x").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::ImportQueueFull.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn messages_are_user_facing() {
        let err = AppError::duplicate("ISBN", "978-0132350884");
        assert_eq!(err.to_string(), "ISBN '978-0132350884' already exists");

        let err = AppError::not_found("Book", 42);
        assert_eq!(err.to_string(), "Book not found with id: 42");
    }
}
