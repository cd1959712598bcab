//! User profile handlers.

use std::sync::Arc;

use axum::extract::State;

use jecris_core::User;

use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Get the authenticated user's profile.
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<ApiResponse<User>, ApiError> {
    let user = state
        .store
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user not found: {}", auth.user_id)))?;

    Ok(ApiResponse::ok("User retrieved", user))
}

/// List all users (admin only).
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
) -> Result<ApiResponse<Vec<User>>, ApiError> {
    let users = state.store.list_users().await?;

    tracing::debug!(admin_id = %admin.admin_id, count = users.len(), "Listed users");

    Ok(ApiResponse::ok("Users retrieved", users))
}
