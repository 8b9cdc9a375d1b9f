//! In-memory [`BookStore`] used by unit tests (and handy for local demos).
//! Mirrors the Postgres implementation's observable behavior: sequential ids,
//! store-assigned timestamps, case-insensitive search, sorted aggregates.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::book::Book;
use crate::models::page::{Page, PageRequest, SortDirection, SortField};
use crate::store::{BookStore, NewBook, StoreError};

#[derive(Default)]
pub struct MemoryBookStore {
    books: RwLock<BTreeMap<i64, Book>>,
    next_id: AtomicI64,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self {
            books: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn sort_books(books: &mut [Book], request: &PageRequest) {
        books.sort_by(|a, b| {
            let ord = match request.sort_by {
                SortField::Id => a.id.cmp(&b.id),
                SortField::Title => a.title.cmp(&b.title),
                SortField::Author => a.author.cmp(&b.author),
                SortField::Isbn => a.isbn.cmp(&b.isbn),
                SortField::PublishedDate => a.published_date.cmp(&b.published_date),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            match request.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        });
    }

    fn paginate(mut books: Vec<Book>, request: &PageRequest) -> Page<Book> {
        let total = books.len() as i64;
        Self::sort_books(&mut books, request);
        let content: Vec<Book> = books
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size as usize)
            .collect();
        Page::new(content, request, total)
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        let now = Utc::now();
        let record = Book {
            id,
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            published_date: book.published_date,
            created_at: now,
            updated_at: now,
        };
        self.books.write().await.insert(id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, StoreError> {
        Ok(self.books.read().await.get(&id).cloned())
    }

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, StoreError> {
        Ok(self
            .books
            .read()
            .await
            .values()
            .any(|b| b.isbn == isbn))
    }

    async fn update(&self, id: i64, book: NewBook) -> Result<Option<Book>, StoreError> {
        let mut books = self.books.write().await;
        match books.get_mut(&id) {
            Some(existing) => {
                existing.title = book.title;
                existing.author = book.author;
                existing.isbn = book.isbn;
                existing.published_date = book.published_date;
                existing.updated_at = Utc::now();
                Ok(Some(existing.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.books.write().await.remove(&id).is_some())
    }

    async fn list(&self, request: &PageRequest) -> Result<Page<Book>, StoreError> {
        let books: Vec<Book> = self.books.read().await.values().cloned().collect();
        Ok(Self::paginate(books, request))
    }

    async fn search(&self, keyword: &str, request: &PageRequest) -> Result<Page<Book>, StoreError> {
        let needle = keyword.to_lowercase();
        let books: Vec<Book> = self
            .books
            .read()
            .await
            .values()
            .filter(|b| {
                b.title.to_lowercase().contains(&needle)
                    || b.author.to_lowercase().contains(&needle)
                    || b.isbn.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        Ok(Self::paginate(books, request))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.books.read().await.len() as i64)
    }

    async fn distinct_authors(&self) -> Result<Vec<String>, StoreError> {
        let authors: BTreeSet<String> = self
            .books
            .read()
            .await
            .values()
            .map(|b| b.author.clone())
            .collect();
        Ok(authors.into_iter().collect())
    }

    async fn count_by_year(&self) -> Result<Vec<(i32, i64)>, StoreError> {
        use chrono::Datelike;
        let mut histogram: BTreeMap<i32, i64> = BTreeMap::new();
        for book in self.books.read().await.values() {
            *histogram.entry(book.published_date.year()).or_insert(0) += 1;
        }
        Ok(histogram.into_iter().collect())
    }

    async fn earliest_published(&self) -> Result<Option<Book>, StoreError> {
        Ok(self
            .books
            .read()
            .await
            .values()
            .min_by(|a, b| {
                a.published_date
                    .cmp(&b.published_date)
                    .then(a.id.cmp(&b.id))
            })
            .cloned())
    }

    async fn latest_published(&self) -> Result<Option<Book>, StoreError> {
        Ok(self
            .books
            .read()
            .await
            .values()
            .max_by(|a, b| {
                a.published_date
                    .cmp(&b.published_date)
                    .then(b.id.cmp(&a.id))
            })
            .cloned())
    }
}
