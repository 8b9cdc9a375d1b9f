use serde::{Deserialize, Serialize};

/// Coarse classification of a failed import row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowErrorKind {
    /// Fewer than 4 cells in the row.
    InvalidFormat,
    /// One of the 4 expected cells is empty after trimming.
    MissingFields,
    /// Published date not in strict YYYY-MM-DD form.
    InvalidDate,
    /// Field constraint failure (ISBN pattern, length limits).
    ValidationError,
    /// Business rule violation (future published date).
    BusinessLogicError,
    /// ISBN already exists in the store.
    DuplicateIsbn,
    /// Anything else (store failure mid-batch, etc.).
    UnexpectedError,
}

/// A per-row failure captured during bulk import.
///
/// Row numbers are 1-based and count from the first row of the file, header
/// included, so they match what the user sees in a spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    pub error: String,
    pub raw_data: String,
    pub error_type: RowErrorKind,
}

impl RowError {
    pub fn new(row: usize, kind: RowErrorKind, message: impl Into<String>, raw: &[String]) -> Self {
        Self {
            row,
            title: None,
            isbn: None,
            error: message.into(),
            raw_data: raw.join(","),
            error_type: kind,
        }
    }

    pub fn with_fields(mut self, title: &str, isbn: &str) -> Self {
        self.title = Some(title.to_string());
        self.isbn = Some(isbn.to_string());
        self
    }
}

/// Result of a synchronous bulk import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<RowError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_type_serializes_screaming_snake() {
        let err = RowError::new(
            3,
            RowErrorKind::DuplicateIsbn,
            "Book with this ISBN already exists",
            &["a".to_string(), "b".to_string()],
        );
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["errorType"], "DUPLICATE_ISBN");
        assert_eq!(json["row"], 3);
        assert_eq!(json["rawData"], "a,b");
        assert!(json.get("title").is_none());
    }

    #[test]
    fn with_fields_attaches_title_and_isbn() {
        let err = RowError::new(2, RowErrorKind::InvalidDate, "bad date", &[])
            .with_fields("Dune", "978-0441172719");
        assert_eq!(err.title.as_deref(), Some("Dune"));
        assert_eq!(err.isbn.as_deref(), Some("978-0441172719"));
    }
}
