use chrono::NaiveDate;
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};

/// A persisted book record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub published_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Incoming book data for create and update requests.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    #[garde(length(min = 1, max = 500))]
    pub title: String,

    #[garde(length(min = 1, max = 255))]
    pub author: String,

    /// 10-17 characters: digits, X, or hyphens.
    #[garde(pattern(r"^[0-9Xx-]{10,17}$"))]
    pub isbn: String,

    #[garde(skip)]
    pub published_date: NaiveDate,
}

impl BookPayload {
    /// Canonicalize the payload: trim title/author, trim + uppercase the ISBN.
    ///
    /// Every ISBN comparison and every write goes through this, so the
    /// column-level unique index and the service-level duplicate checks always
    /// see the same representation.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.author = self.author.trim().to_string();
        self.isbn = normalize_isbn(&self.isbn);
        self
    }
}

/// Trim and uppercase an ISBN string.
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.trim().to_ascii_uppercase()
}

/// Compact book view used in the statistics response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub published_date: NaiveDate,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            published_date: book.published_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(isbn: &str) -> BookPayload {
        BookPayload {
            title: "  The Rust Programming Language ".to_string(),
            author: " Steve Klabnik ".to_string(),
            isbn: isbn.to_string(),
            published_date: NaiveDate::from_ymd_opt(2019, 8, 12).unwrap(),
        }
    }

    #[test]
    fn normalized_trims_and_uppercases() {
        let p = payload(" 978-1x93778-528 ").normalized();
        assert_eq!(p.title, "The Rust Programming Language");
        assert_eq!(p.author, "Steve Klabnik");
        assert_eq!(p.isbn, "978-1X93778-528");
    }

    #[test]
    fn valid_isbn_passes_validation() {
        let p = payload("978-0132350884").normalized();
        assert!(p.validate().is_ok());
    }

    #[test]
    fn bad_isbn_pattern_fails_validation() {
        let p = payload("not-an-isbn!").normalized();
        assert!(p.validate().is_err());
    }

    #[test]
    fn empty_title_fails_validation() {
        let mut p = payload("978-0132350884").normalized();
        p.title = String::new();
        assert!(p.validate().is_err());
    }
}
