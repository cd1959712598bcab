//! Library handlers.

use std::sync::Arc;

use axum::extract::State;
use serde::Deserialize;

use jecris_core::{BookId, LibraryBook, LibraryEntry};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Claim request for a free book.
#[derive(Debug, Deserialize)]
pub struct ClaimBookRequest {
    /// Book to claim.
    pub book_id: BookId,
}

/// List the caller's owned books with reading progress.
pub async fn list_library(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<ApiResponse<Vec<LibraryBook>>, ApiError> {
    let books = state.store.list_library(&auth.user_id).await?;
    Ok(ApiResponse::ok("Library retrieved", books))
}

/// Add a free book to the caller's library.
///
/// Paid books only enter the library through a completed checkout.
pub async fn claim_book(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<ClaimBookRequest>,
) -> Result<ApiResponse<LibraryEntry>, ApiError> {
    let book = state
        .store
        .get_book(&body.book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book not found: {}", body.book_id)))?;

    if !book.is_free() {
        return Err(ApiError::PaymentRequired(
            "This book must be purchased through checkout".into(),
        ));
    }

    let entry = state
        .store
        .add_to_library(&auth.user_id, &book.id)
        .await
        .map_err(|e| match e {
            jecris_store::StoreError::Conflict(_) => {
                ApiError::Conflict("Book already in library".into())
            }
            other => other.into(),
        })?;

    tracing::info!(user_id = %auth.user_id, book_id = %book.id, "Free book claimed");

    Ok(ApiResponse::created("Book added to library", entry))
}
