//! Registration, login and session handlers.

use std::sync::Arc;

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jecris_core::{normalize_email, validate_password, NewUser, User};

use crate::auth::issue_token;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Email and password, as sent by the register and login forms.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
}

/// Successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    /// Token type, always `Bearer`.
    pub token_type: &'static str,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// The logged-in user.
    pub user: User,
}

/// Email availability check.
#[derive(Debug, Deserialize)]
pub struct CheckEmailRequest {
    /// Address to check.
    #[serde(default)]
    pub email: String,
}

/// Email availability result.
#[derive(Debug, Serialize)]
pub struct CheckEmailResponse {
    /// Normalized address.
    pub email: String,
    /// Whether the address can still be registered.
    pub available: bool,
}

/// Register a new user.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    let email = normalize_email(&body.email)?;
    validate_password(&body.password)?;

    if state.store.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let password_hash = state
        .passwords
        .hash(&body.password)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    // The unique index still catches a concurrent registration
    let user = state
        .store
        .create_user(&NewUser::new(&email, password_hash)?)
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(ApiResponse::created("Registration successful", user))
}

/// Exchange email and password for a bearer token.
///
/// Unknown emails and wrong passwords get the same response.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    let email = body.email.trim().to_lowercase();

    let Some(user) = state.store.get_user_by_email(&email).await? else {
        tracing::debug!("Login attempt for unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    let valid = state
        .passwords
        .verify(&body.password, &user.password_hash)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if !valid {
        tracing::debug!(user_id = %user.id, "Login attempt with wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let issued = issue_token(
        &user,
        &state.config.jwt_secret,
        state.config.token_ttl_seconds,
    )?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(ApiResponse::ok(
        "Login successful",
        LoginResponse {
            token: issued.token,
            token_type: "Bearer",
            expires_at: issued.expires_at,
            user,
        },
    ))
}

/// Report whether an email can still be registered.
pub async fn check_email(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CheckEmailRequest>,
) -> Result<ApiResponse<CheckEmailResponse>, ApiError> {
    let email = normalize_email(&body.email)?;
    let available = state.store.get_user_by_email(&email).await?.is_none();

    let message = if available {
        "Email is available"
    } else {
        "Email already registered"
    };

    Ok(ApiResponse::ok(message, CheckEmailResponse { email, available }))
}

/// Acknowledge a logout. Tokens are stateless; the client drops its copy.
pub async fn logout() -> ApiResponse<Option<()>> {
    ApiResponse::ok("Logout successful", None)
}
