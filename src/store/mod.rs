//! Storage abstraction for book records.
//!
//! The catalog service talks to a [`BookStore`] trait object so tests can run
//! against the in-memory implementation while production uses Postgres
//! (`crate::db::PgBookStore`).

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::book::Book;
use crate::models::page::{Page, PageRequest};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fields of a book record under the caller's control; ids and timestamps are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub published_date: NaiveDate,
}

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn insert(&self, book: NewBook) -> Result<Book, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, StoreError>;

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, StoreError>;

    /// Overwrite the mutable fields of an existing record, bumping
    /// `updated_at`. Returns the stored record, or None when the id is gone.
    async fn update(&self, id: i64, book: NewBook) -> Result<Option<Book>, StoreError>;

    /// Returns true when a record was actually deleted.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    async fn list(&self, request: &PageRequest) -> Result<Page<Book>, StoreError>;

    /// Case-insensitive substring match over title, author, and ISBN.
    async fn search(&self, keyword: &str, request: &PageRequest) -> Result<Page<Book>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    /// Distinct authors in ascending order.
    async fn distinct_authors(&self) -> Result<Vec<String>, StoreError>;

    /// Publication-year histogram as (year, count) pairs.
    async fn count_by_year(&self) -> Result<Vec<(i32, i64)>, StoreError>;

    async fn earliest_published(&self) -> Result<Option<Book>, StoreError>;

    async fn latest_published(&self) -> Result<Option<Book>, StoreError>;
}
