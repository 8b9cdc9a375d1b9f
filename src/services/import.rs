//! CSV bulk import: parsing, per-row validation, and the synchronous import
//! loop. The async worker pool reuses [`import_row`] for identical semantics.
//!
//! Expected format: `title,author,isbn,publishedDate` with `YYYY-MM-DD` dates.
//! A header row is auto-detected and skipped. Each row succeeds or fails on
//! its own; only file-level problems (empty or unparseable input) abort the
//! whole operation.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::book::{Book, BookPayload};
use crate::models::import::{ImportReport, RowError, RowErrorKind};
use crate::services::catalog::CatalogService;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// All rows of an uploaded CSV plus the index of the first data row.
#[derive(Debug)]
pub struct CsvRows {
    pub rows: Vec<Vec<String>>,
    pub data_start: usize,
}

impl CsvRows {
    pub fn total_data_rows(&self) -> usize {
        self.rows.len() - self.data_start
    }
}

/// Parse the uploaded bytes. Fails the whole operation when the file is empty
/// or not parseable as CSV.
pub fn parse_csv(bytes: &[u8]) -> Result<CsvRows, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| AppError::file_processing(format!("Failed to parse CSV file: {e}")))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    if rows.is_empty() {
        return Err(AppError::file_processing("CSV file is empty"));
    }

    // First cell "title" or "book" marks a header row.
    let data_start = match rows[0].first() {
        Some(cell)
            if cell.trim().eq_ignore_ascii_case("title")
                || cell.trim().eq_ignore_ascii_case("book") =>
        {
            debug!("Detected header row, skipping it");
            1
        }
        _ => 0,
    };

    Ok(CsvRows { rows, data_start })
}

/// Validate and persist a single row. `row_number` is 1-based and counts from
/// the first row of the file, header included.
pub async fn import_row(
    catalog: &CatalogService,
    row: &[String],
    row_number: usize,
) -> Result<Book, RowError> {
    if row.len() < 4 {
        return Err(RowError::new(
            row_number,
            RowErrorKind::InvalidFormat,
            "Invalid row format. Expected 4 columns: title,author,isbn,publishedDate",
            row,
        ));
    }

    let title = row[0].trim();
    let author = row[1].trim();
    let isbn = row[2].trim();
    let date_str = row[3].trim();

    if title.is_empty() || author.is_empty() || isbn.is_empty() || date_str.is_empty() {
        return Err(RowError::new(
            row_number,
            RowErrorKind::MissingFields,
            "All fields are required (title, author, isbn, publishedDate)",
            row,
        )
        .with_fields(title, isbn));
    }

    let published_date = match NaiveDate::parse_from_str(date_str, DATE_FORMAT) {
        Ok(date) => date,
        Err(_) => {
            return Err(RowError::new(
                row_number,
                RowErrorKind::InvalidDate,
                "Invalid date format. Use YYYY-MM-DD (e.g., 2024-01-15)",
                row,
            )
            .with_fields(title, isbn));
        }
    };

    let payload = BookPayload {
        title: title.to_string(),
        author: author.to_string(),
        isbn: isbn.to_string(),
        published_date,
    };

    catalog.create(payload).await.map_err(|e| {
        let (kind, message) = match &e {
            AppError::Validation(report) => {
                (RowErrorKind::ValidationError, report.to_string())
            }
            AppError::BusinessRule { message, .. } => {
                (RowErrorKind::BusinessLogicError, message.clone())
            }
            AppError::Duplicate { .. } => (
                RowErrorKind::DuplicateIsbn,
                "Book with this ISBN already exists".to_string(),
            ),
            other => (
                RowErrorKind::UnexpectedError,
                format!("Unexpected error: {other}"),
            ),
        };
        RowError::new(row_number, kind, message, row).with_fields(title, isbn)
    })
}

/// Synchronous import: process every data row in file order, collecting a
/// success count and the ordered error list. A bad row never aborts the batch.
pub async fn run_import(catalog: &CatalogService, csv_rows: &CsvRows) -> ImportReport {
    let mut errors: Vec<RowError> = Vec::new();
    let mut success_count = 0;

    for (index, row) in csv_rows.rows.iter().enumerate().skip(csv_rows.data_start) {
        let row_number = index + 1;
        match import_row(catalog, row, row_number).await {
            Ok(book) => {
                success_count += 1;
                debug!(row = row_number, title = %book.title, "Imported book");
            }
            Err(row_error) => errors.push(row_error),
        }
    }

    info!(
        success = success_count,
        failed = errors.len(),
        total = csv_rows.total_data_rows(),
        "Bulk import completed"
    );

    ImportReport {
        success_count,
        failure_count: errors.len(),
        errors,
    }
}
