//! Catalog handlers.

use std::sync::Arc;

use axum::extract::State;

use jecris_core::{Author, BookId, BookSummary, NewBook};

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::response::ApiResponse;
use crate::state::AppState;

/// List the catalog.
pub async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<Vec<BookSummary>>, ApiError> {
    let books = state.store.list_books().await?;
    Ok(ApiResponse::ok("Books retrieved", books))
}

/// Get one book's details, without its content.
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    ApiPath(book_id): ApiPath<BookId>,
) -> Result<ApiResponse<BookSummary>, ApiError> {
    let book = state
        .store
        .get_book(&book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book not found: {book_id}")))?;

    Ok(ApiResponse::ok("Book retrieved", BookSummary::from(&book)))
}

/// Add a book to the catalog (admin only).
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    ApiJson(body): ApiJson<NewBook>,
) -> Result<ApiResponse<BookSummary>, ApiError> {
    let new_book = body.validated()?;
    let book = state.store.create_book(&new_book).await?;

    tracing::info!(
        admin_id = %admin.admin_id,
        book_id = %book.id,
        title = %book.title,
        price_cents = book.price_cents,
        "Book added to catalog"
    );

    Ok(ApiResponse::created("Book created", BookSummary::from(&book)))
}

/// List authors.
pub async fn list_authors(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<Vec<Author>>, ApiError> {
    let authors = state.store.list_authors().await?;
    Ok(ApiResponse::ok("Authors retrieved", authors))
}
