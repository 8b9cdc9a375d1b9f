use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::models::book::{Book, BookPayload};
use crate::models::page::Page;
use crate::models::response::ApiResponse;
use crate::models::stats::LibraryStats;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
    #[serde(default = "default_sort_by", rename = "sortBy")]
    pub sort_by: String,
    #[serde(default = "default_direction")]
    pub direction: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

fn default_size() -> i64 {
    10
}

fn default_sort_by() -> String {
    "id".to_string()
}

fn default_direction() -> String {
    "ASC".to_string()
}

/// POST /api/v1/books — create a new book.
pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<BookPayload>,
) -> Result<(StatusCode, Json<ApiResponse<Book>>), AppError> {
    info!(title = %payload.title, "Request to add new book");
    let book = state.catalog.create(payload).await?;
    metrics::counter!("books_created_total").increment(1);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(book, "Book created successfully")),
    ))
}

/// GET /api/v1/books — paginated listing with sorting.
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Page<Book>>>, AppError> {
    let page = state
        .catalog
        .list(params.page, params.size, &params.sort_by, &params.direction)
        .await?;

    let message = format!("Retrieved {} books", page.content.len());
    Ok(Json(ApiResponse::success(page, message)))
}

/// GET /api/v1/books/{id} — fetch a single book.
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Book>>, AppError> {
    let book = state.catalog.get(id).await?;
    Ok(Json(ApiResponse::success(book, "Book retrieved successfully")))
}

/// GET /api/v1/books/search — keyword search over title, author, and ISBN.
pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Page<Book>>>, AppError> {
    let page = state
        .catalog
        .search(&params.keyword, params.page, params.size)
        .await?;

    let message = format!("Found {} matching books", page.total_elements);
    Ok(Json(ApiResponse::success(page, message)))
}

/// PUT /api/v1/books/{id} — update an existing book.
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<ApiResponse<Book>>, AppError> {
    info!(id, "Request to update book");
    let book = state.catalog.update(id, payload).await?;
    Ok(Json(ApiResponse::success(book, "Book updated successfully")))
}

/// DELETE /api/v1/books/{id} — remove a book. 204 on success, no body.
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    info!(id, "Request to delete book");
    state.catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/books/stats — aggregate library statistics.
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<LibraryStats>>, AppError> {
    let stats = state.catalog.stats().await?;
    Ok(Json(ApiResponse::success(
        stats,
        "Statistics retrieved successfully",
    )))
}
