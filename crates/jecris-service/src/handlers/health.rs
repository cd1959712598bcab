//! Liveness endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process answers.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Whether checkout sessions can be opened.
    pub payments_enabled: bool,
    /// Whether Stripe webhooks are accepted.
    pub webhooks_enabled: bool,
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "jecris",
        version: env!("CARGO_PKG_VERSION"),
        payments_enabled: state.has_stripe(),
        webhooks_enabled: state.config.stripe_webhook_secret.is_some(),
    })
}
