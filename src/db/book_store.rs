use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::models::book::Book;
use crate::models::page::{Page, PageRequest};
use crate::store::{BookStore, NewBook, StoreError};

const BOOK_COLUMNS: &str = "id, title, author, isbn, published_date, created_at, updated_at";

/// Postgres-backed [`BookStore`]. ISBNs arrive already canonicalized by the
/// service, the `books_isbn_key` unique index is the backstop.
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn insert(&self, book: NewBook) -> Result<Book, StoreError> {
        let record = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, author, isbn, published_date)
            VALUES ($1, $2, $3, $4)
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.published_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Book>, StoreError> {
        let record = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn exists_by_isbn(&self, isbn: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
                .bind(isbn)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update(&self, id: i64, book: NewBook) -> Result<Option<Book>, StoreError> {
        let record = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books
            SET title = $1, author = $2, isbn = $3, published_date = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.published_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, request: &PageRequest) -> Result<Page<Book>, StoreError> {
        // sort_by/direction come from whitelist enums, never raw user input.
        let content = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY {} {} LIMIT $1 OFFSET $2",
            request.sort_by.column(),
            request.direction.keyword(),
        ))
        .bind(request.size)
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(content, request, total))
    }

    async fn search(&self, keyword: &str, request: &PageRequest) -> Result<Page<Book>, StoreError> {
        let pattern = format!("%{}%", keyword);

        let content = sqlx::query_as::<_, Book>(&format!(
            r#"
            SELECT {BOOK_COLUMNS} FROM books
            WHERE title ILIKE $1 OR author ILIKE $1 OR isbn ILIKE $1
            ORDER BY {} {}
            LIMIT $2 OFFSET $3
            "#,
            request.sort_by.column(),
            request.direction.keyword(),
        ))
        .bind(&pattern)
        .bind(request.size)
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE title ILIKE $1 OR author ILIKE $1 OR isbn ILIKE $1",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page::new(content, request, total))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn distinct_authors(&self) -> Result<Vec<String>, StoreError> {
        let authors: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT author FROM books ORDER BY author")
                .fetch_all(&self.pool)
                .await?;

        Ok(authors)
    }

    async fn count_by_year(&self) -> Result<Vec<(i32, i64)>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT EXTRACT(YEAR FROM published_date)::INT4 AS year, COUNT(*) AS count
            FROM books
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| Ok((r.try_get("year")?, r.try_get("count")?)))
            .collect()
    }

    async fn earliest_published(&self) -> Result<Option<Book>, StoreError> {
        let record = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY published_date ASC, id ASC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn latest_published(&self) -> Result<Option<Book>, StoreError> {
        let record = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY published_date DESC, id ASC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
