//! Checkout and payment history handlers.

use std::sync::Arc;

use axum::extract::State;
use serde::Serialize;

use jecris_core::{BookId, PaymentRecord, MAX_BOOKS_PER_CHECKOUT};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::stripe::{CheckoutLine, CheckoutRequest};

/// A Checkout session the client should redirect to.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Stripe session ID.
    pub session_id: String,
    /// Hosted payment page.
    pub checkout_url: Option<String>,
    /// Books included in the session.
    pub book_ids: Vec<BookId>,
    /// Sum of line amounts in cents.
    pub amount_cents: i64,
}

/// Open a Stripe Checkout session for everything in the caller's cart.
///
/// The books are credited later, when Stripe delivers
/// `checkout.session.completed` to the webhook.
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<ApiResponse<CheckoutResponse>, ApiError> {
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Payments are not configured".into()))?;

    let cart = state.store.list_cart(&auth.user_id).await?;
    if cart.is_empty() {
        return Err(ApiError::BadRequest("Cart is empty".into()));
    }
    if cart.len() > MAX_BOOKS_PER_CHECKOUT {
        return Err(ApiError::BadRequest(format!(
            "A checkout holds at most {MAX_BOOKS_PER_CHECKOUT} books"
        )));
    }

    let book_ids: Vec<BookId> = cart.iter().map(|line| line.book_id).collect();
    let lines: Vec<CheckoutLine> = cart
        .iter()
        .map(|line| CheckoutLine {
            name: line.title.clone(),
            description: Some(format!("by {}", line.author)),
            unit_amount: line.price_cents,
        })
        .collect();
    let amount_cents: i64 = lines.iter().map(|l| l.unit_amount).sum();

    let success_url = state.config.checkout_success_url();
    let cancel_url = state.config.checkout_cancel_url();

    let session = stripe
        .create_checkout_session(&CheckoutRequest {
            user_id: auth.user_id,
            book_ids: &book_ids,
            lines: &lines,
            currency: &state.config.currency,
            success_url: &success_url,
            cancel_url: &cancel_url,
            customer_email: Some(&auth.email),
        })
        .await
        .map_err(|e| {
            tracing::error!(user_id = %auth.user_id, error = %e, "Failed to create checkout session");
            ApiError::ExternalService(format!("Payment provider error: {e}"))
        })?;

    tracing::info!(
        user_id = %auth.user_id,
        session_id = %session.id,
        books = book_ids.len(),
        amount_cents,
        "Checkout session created"
    );

    Ok(ApiResponse::ok(
        "Checkout session created",
        CheckoutResponse {
            session_id: session.id,
            checkout_url: session.url,
            book_ids,
            amount_cents,
        },
    ))
}

/// List the caller's recorded payments, newest first.
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<ApiResponse<Vec<PaymentRecord>>, ApiError> {
    let payments = state.store.list_payments(&auth.user_id).await?;
    Ok(ApiResponse::ok("Payments retrieved", payments))
}
