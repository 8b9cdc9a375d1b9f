use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use garde::Validate;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::book::{normalize_isbn, Book, BookPayload, BookSummary};
use crate::models::page::{Page, PageRequest};
use crate::models::stats::LibraryStats;
use crate::store::{BookStore, NewBook};

/// Business-rule layer over the book store: date and uniqueness checks for
/// single-record CRUD, paginated listing, search, and statistics.
pub struct CatalogService {
    store: Arc<dyn BookStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn BookStore> {
        &self.store
    }

    /// Create a book after field validation, the future-date rule, and the
    /// duplicate-ISBN check. Nothing is written when any of them fails.
    pub async fn create(&self, payload: BookPayload) -> Result<Book, AppError> {
        let payload = payload.normalized();
        payload.validate()?;
        validate_published_date(payload.published_date)?;

        if self.store.exists_by_isbn(&payload.isbn).await? {
            warn!(isbn = %payload.isbn, "Attempted to create book with duplicate ISBN");
            return Err(AppError::duplicate("ISBN", payload.isbn));
        }

        let book = self
            .store
            .insert(NewBook {
                title: payload.title,
                author: payload.author,
                isbn: payload.isbn,
                published_date: payload.published_date,
            })
            .await?;

        info!(id = book.id, title = %book.title, "Book created");
        Ok(book)
    }

    pub async fn get(&self, id: i64) -> Result<Book, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))
    }

    /// Paginated listing. Out-of-range page/size values are clamped, unknown
    /// sort fields fall back to `id` ascending.
    pub async fn list(
        &self,
        page: i64,
        size: i64,
        sort_by: &str,
        direction: &str,
    ) -> Result<Page<Book>, AppError> {
        let request = PageRequest::clamped(page, size, sort_by, direction);
        Ok(self.store.list(&request).await?)
    }

    /// Keyword search over title, author, and ISBN. A blank keyword behaves
    /// exactly like `list` with the default sort.
    pub async fn search(
        &self,
        keyword: &str,
        page: i64,
        size: i64,
    ) -> Result<Page<Book>, AppError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return self.list(page, size, "id", "ASC").await;
        }

        let request = PageRequest::clamped(page, size, "id", "ASC");
        Ok(self.store.search(keyword, &request).await?)
    }

    pub async fn update(&self, id: i64, payload: BookPayload) -> Result<Book, AppError> {
        let payload = payload.normalized();
        payload.validate()?;

        let existing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))?;

        validate_published_date(payload.published_date)?;

        // Both sides are canonicalized, so a plain compare is enough.
        if normalize_isbn(&existing.isbn) != payload.isbn
            && self.store.exists_by_isbn(&payload.isbn).await?
        {
            warn!(isbn = %payload.isbn, "Attempted to update book to duplicate ISBN");
            return Err(AppError::duplicate("ISBN", payload.isbn));
        }

        let updated = self
            .store
            .update(
                id,
                NewBook {
                    title: payload.title,
                    author: payload.author,
                    isbn: payload.isbn,
                    published_date: payload.published_date,
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found("Book", id))?;

        info!(id = updated.id, title = %updated.title, "Book updated");
        Ok(updated)
    }

    /// Delete the record. When the id is unknown the store sees no delete.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if self.store.find_by_id(id).await?.is_none() {
            return Err(AppError::not_found("Book", id));
        }

        self.store.delete(id).await?;
        info!(id, "Book deleted");
        Ok(())
    }

    /// Aggregate statistics. Oldest/newest are only present when the catalog
    /// has at least one record.
    pub async fn stats(&self) -> Result<LibraryStats, AppError> {
        let total_books = self.store.count().await?;
        let unique_authors = self.store.distinct_authors().await?;
        let books_by_year: BTreeMap<i32, i64> =
            self.store.count_by_year().await?.into_iter().collect();

        let (oldest_book, newest_book) = if total_books > 0 {
            (
                self.store
                    .earliest_published()
                    .await?
                    .as_ref()
                    .map(BookSummary::from),
                self.store
                    .latest_published()
                    .await?
                    .as_ref()
                    .map(BookSummary::from),
            )
        } else {
            (None, None)
        };

        info!(
            total_books,
            unique_authors = unique_authors.len(),
            "Statistics calculated"
        );

        Ok(LibraryStats {
            total_books,
            unique_authors_count: unique_authors.len(),
            unique_authors,
            books_by_year,
            oldest_book,
            newest_book,
        })
    }
}

/// Business rule: a published date must not lie in the future.
pub fn validate_published_date(published_date: NaiveDate) -> Result<(), AppError> {
    let today = Utc::now().date_naive();
    if published_date > today {
        return Err(AppError::business_rule(
            "Published date cannot be in the future",
            Some(serde_json::json!({
                "providedDate": published_date.to_string(),
                "currentDate": today.to_string(),
            })),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryBookStore;
    use chrono::Duration;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(MemoryBookStore::new()))
    }

    fn payload(title: &str, isbn: &str, date: NaiveDate) -> BookPayload {
        BookPayload {
            title: title.to_string(),
            author: "Test Author".to_string(),
            isbn: isbn.to_string(),
            published_date: date,
        }
    }

    fn past_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2008, 8, 1).unwrap()
    }

    #[tokio::test]
    async fn create_rejects_duplicate_isbn_without_writing() {
        let svc = service();
        svc.create(payload("First", "978-0132350884", past_date()))
            .await
            .unwrap();

        // Same ISBN with different case and padding still collides.
        let err = svc
            .create(payload("Second", " 978-0132350884 ", past_date()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
        assert_eq!(svc.store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn create_rejects_future_date_without_writing() {
        let svc = service();
        let tomorrow = Utc::now().date_naive() + Duration::days(1);

        let err = svc
            .create(payload("Future", "978-0132350884", tomorrow))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule { .. }));
        assert_eq!(svc.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn create_rejects_invalid_isbn_pattern() {
        let svc = service();
        let err = svc
            .create(payload("Bad", "short", past_date()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(svc.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_clamps_invalid_page_and_size() {
        let svc = service();
        for i in 0..15 {
            svc.create(payload(
                &format!("Book {i}"),
                &format!("11111111{i:02}"),
                past_date(),
            ))
            .await
            .unwrap();
        }

        let clamped = svc.list(-1, -5, "id", "ASC").await.unwrap();
        let defaults = svc.list(0, 10, "id", "ASC").await.unwrap();
        assert_eq!(clamped.page, defaults.page);
        assert_eq!(clamped.size, defaults.size);
        assert_eq!(clamped.content.len(), defaults.content.len());
        assert_eq!(clamped.total_pages, 2);
    }

    #[tokio::test]
    async fn blank_search_equals_default_list() {
        let svc = service();
        svc.create(payload("Dune", "9780441172719", past_date()))
            .await
            .unwrap();
        svc.create(payload("Hyperion", "9780553283686", past_date()))
            .await
            .unwrap();

        let searched = svc.search("   ", 0, 10).await.unwrap();
        let listed = svc.list(0, 10, "id", "ASC").await.unwrap();
        let search_ids: Vec<i64> = searched.content.iter().map(|b| b.id).collect();
        let list_ids: Vec<i64> = listed.content.iter().map(|b| b.id).collect();
        assert_eq!(search_ids, list_ids);
    }

    #[tokio::test]
    async fn search_matches_title_author_and_isbn() {
        let svc = service();
        svc.create(payload("Dune", "9780441172719", past_date()))
            .await
            .unwrap();

        assert_eq!(svc.search("dune", 0, 10).await.unwrap().content.len(), 1);
        assert_eq!(svc.search("test auth", 0, 10).await.unwrap().content.len(), 1);
        assert_eq!(svc.search("0441", 0, 10).await.unwrap().content.len(), 1);
        assert_eq!(svc.search("zzz", 0, 10).await.unwrap().content.len(), 0);
    }

    #[tokio::test]
    async fn update_allows_same_isbn_and_rejects_taken_one() {
        let svc = service();
        let first = svc
            .create(payload("First", "978-0132350884", past_date()))
            .await
            .unwrap();
        svc.create(payload("Second", "978-0201616224", past_date()))
            .await
            .unwrap();

        // Keeping its own ISBN (different case) is fine.
        let updated = svc
            .update(first.id, payload("First v2", "978-0132350884", past_date()))
            .await
            .unwrap();
        assert_eq!(updated.title, "First v2");

        // Taking the other book's ISBN conflicts.
        let err = svc
            .update(first.id, payload("First v3", "978-0201616224", past_date()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn update_missing_book_is_not_found() {
        let svc = service();
        let err = svc
            .update(999, payload("Ghost", "978-0132350884", past_date()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn update_rejects_future_date_without_writing() {
        let svc = service();
        let book = svc
            .create(payload("First", "978-0132350884", past_date()))
            .await
            .unwrap();

        let tomorrow = Utc::now().date_naive() + Duration::days(1);
        let err = svc
            .update(book.id, payload("First v2", "978-0132350884", tomorrow))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule { .. }));

        let unchanged = svc.get(book.id).await.unwrap();
        assert_eq!(unchanged.title, "First");
    }

    #[tokio::test]
    async fn delete_missing_book_is_not_found() {
        let svc = service();
        let err = svc.delete(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn stats_on_empty_store_omit_oldest_and_newest() {
        let svc = service();
        let stats = svc.stats().await.unwrap();
        assert_eq!(stats.total_books, 0);
        assert_eq!(stats.unique_authors_count, 0);
        assert!(stats.oldest_book.is_none());
        assert!(stats.newest_book.is_none());

        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("oldestBook").is_none());
        assert!(json.get("newestBook").is_none());
    }

    #[tokio::test]
    async fn stats_report_histogram_and_extremes() {
        let svc = service();
        svc.create(payload(
            "Old",
            "1111111111",
            NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
        ))
        .await
        .unwrap();
        svc.create(payload(
            "New",
            "2222222222",
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        ))
        .await
        .unwrap();

        let stats = svc.stats().await.unwrap();
        assert_eq!(stats.total_books, 2);
        assert_eq!(stats.unique_authors_count, 1);
        assert_eq!(stats.books_by_year.get(&1965), Some(&1));
        assert_eq!(stats.oldest_book.as_ref().unwrap().title, "Old");
        assert_eq!(stats.newest_book.as_ref().unwrap().title, "New");
    }
}
