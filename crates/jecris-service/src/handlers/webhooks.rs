//! Stripe webhook handler.
//!
//! Stripe delivers events at least once, so the same
//! `checkout.session.completed` may arrive several times. The event id is the
//! idempotency key: the store records it in the same transaction that credits
//! the books, and a redelivery finds it and changes nothing.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use jecris_core::{CheckoutMetadata, CoreError, Purchase};
use jecris_store::StoreError;

use crate::crypto::verify_stripe_signature;
use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::{CheckoutSession, WebhookEvent};

/// Event type that completes a purchase.
const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Webhook response.
#[derive(Debug, Default, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was accepted.
    pub received: bool,
    /// Whether this event had already been processed.
    pub duplicate: bool,
    /// Books newly added to the buyer's library.
    pub books_added: usize,
}

impl WebhookResponse {
    fn acknowledged() -> Self {
        Self {
            received: true,
            ..Self::default()
        }
    }
}

/// Handle Stripe webhooks.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    let Some(secret) = state.config.stripe_webhook_secret.as_deref() else {
        return Err(ApiError::Internal(
            "Stripe webhook received but no webhook secret is configured".into(),
        ));
    };

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing Stripe signature".into()))?;

    verify_stripe_signature(
        &body,
        signature,
        secret,
        state.config.webhook_tolerance_seconds,
        chrono::Utc::now().timestamp(),
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "Invalid Stripe webhook signature");
        ApiError::BadRequest("Invalid webhook signature".into())
    })?;

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed event: {e}")))?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = %event.id,
        "Received Stripe webhook"
    );

    if event.event_type != CHECKOUT_COMPLETED {
        tracing::debug!(event_type = %event.event_type, "Unhandled Stripe event");
        return Ok(Json(WebhookResponse::acknowledged()));
    }

    handle_checkout_completed(&state, &event).await.map(Json)
}

async fn handle_checkout_completed(
    state: &AppState,
    event: &WebhookEvent,
) -> Result<WebhookResponse, ApiError> {
    let session: CheckoutSession = serde_json::from_value(event.data.object.clone())
        .map_err(|e| ApiError::BadRequest(format!("Malformed checkout session: {e}")))?;

    // Only process if payment is complete
    if let Some(payment_status) = session.payment_status.as_deref() {
        if payment_status != "paid" {
            tracing::info!(
                session_id = %session.id,
                payment_status = %payment_status,
                "Checkout session not paid yet, skipping"
            );
            return Ok(WebhookResponse::acknowledged());
        }
    }

    let metadata = CheckoutMetadata::from_json(Some(&session.metadata)).map_err(|e| {
        tracing::warn!(event_id = %event.id, session_id = %session.id, error = %e, "Unusable checkout metadata");
        ApiError::from(CoreError::from(e))
    })?;

    let purchase = Purchase {
        payment_id: event.id.clone(),
        user_id: metadata.user_id,
        book_ids: metadata.book_ids,
        amount_cents: session.amount_total.unwrap_or(0),
    };

    tracing::info!(
        event_id = %purchase.payment_id,
        session_id = %session.id,
        user_id = %purchase.user_id,
        books = purchase.book_ids.len(),
        amount_cents = purchase.amount_cents,
        "Processing checkout completion"
    );

    let outcome = state
        .store
        .complete_purchase(&purchase)
        .await
        .map_err(|e| match e {
            // Metadata names a user or book we do not have; retrying will not help
            StoreError::NotFound { .. } => {
                tracing::warn!(event_id = %purchase.payment_id, error = %e, "Checkout references unknown records");
                ApiError::BadRequest(e.to_string())
            }
            other => other.into(),
        })?;

    if outcome.is_duplicate() {
        tracing::info!(event_id = %purchase.payment_id, "Duplicate Stripe event, already processed");
    } else {
        tracing::info!(
            event_id = %purchase.payment_id,
            user_id = %purchase.user_id,
            books_added = outcome.books_added(),
            "Books added from Stripe checkout"
        );
    }

    Ok(WebhookResponse {
        received: true,
        duplicate: outcome.is_duplicate(),
        books_added: outcome.books_added(),
    })
}
