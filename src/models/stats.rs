use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::book::BookSummary;

/// Aggregate statistics over the whole catalog.
///
/// `oldest_book`/`newest_book` are omitted from the JSON entirely when the
/// catalog is empty.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total_books: i64,
    pub unique_authors_count: usize,
    pub unique_authors: Vec<String>,
    pub books_by_year: BTreeMap<i32, i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_book: Option<BookSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_book: Option<BookSummary>,
}
