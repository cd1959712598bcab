//! Cart handlers.

use std::sync::Arc;

use axum::extract::State;
use serde::{Deserialize, Serialize};

use jecris_core::{BookId, CartItem, CartLine};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::response::ApiResponse;
use crate::state::AppState;

/// The caller's cart.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    /// Books waiting for checkout, oldest first.
    pub items: Vec<CartLine>,
    /// Sum of item prices in cents.
    pub total_cents: i64,
}

impl From<Vec<CartLine>> for CartResponse {
    fn from(items: Vec<CartLine>) -> Self {
        let total_cents = items.iter().map(|i| i.price_cents).sum();
        Self { items, total_cents }
    }
}

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    /// Book to add.
    pub book_id: BookId,
}

/// Result of clearing the cart.
#[derive(Debug, Serialize)]
pub struct ClearCartResponse {
    /// Number of items removed.
    pub removed: u64,
}

/// Get the caller's cart.
pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<ApiResponse<CartResponse>, ApiError> {
    let items = state.store.list_cart(&auth.user_id).await?;
    Ok(ApiResponse::ok("Cart retrieved", CartResponse::from(items)))
}

/// Put a paid book in the caller's cart.
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<ApiResponse<CartItem>, ApiError> {
    let book = state
        .store
        .get_book(&body.book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book not found: {}", body.book_id)))?;

    if book.is_free() {
        return Err(ApiError::BadRequest(
            "Free books are added to the library directly".into(),
        ));
    }

    if state
        .store
        .get_library_entry(&auth.user_id, &book.id)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Book already in library".into()));
    }

    let item = state
        .store
        .add_to_cart(&auth.user_id, &book.id)
        .await
        .map_err(|e| match e {
            jecris_store::StoreError::Conflict(_) => {
                ApiError::Conflict("Book already in cart".into())
            }
            other => other.into(),
        })?;

    tracing::debug!(user_id = %auth.user_id, book_id = %book.id, "Book added to cart");

    Ok(ApiResponse::created("Book added to cart", item))
}

/// Remove one book from the caller's cart.
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiPath(book_id): ApiPath<BookId>,
) -> Result<ApiResponse<CartResponse>, ApiError> {
    state
        .store
        .remove_from_cart(&auth.user_id, &book_id)
        .await?;

    let items = state.store.list_cart(&auth.user_id).await?;
    Ok(ApiResponse::ok("Book removed from cart", CartResponse::from(items)))
}

/// Empty the caller's cart.
pub async fn clear_cart(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<ApiResponse<ClearCartResponse>, ApiError> {
    let removed = state.store.clear_cart(&auth.user_id).await?;

    tracing::debug!(user_id = %auth.user_id, removed, "Cart cleared");

    Ok(ApiResponse::ok("Cart cleared", ClearCartResponse { removed }))
}
