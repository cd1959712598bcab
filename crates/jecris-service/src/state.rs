//! Application state.

use std::sync::Arc;

use jecris_store::Store;

use crate::config::ServiceConfig;
use crate::password::PasswordHasher;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Password hashing parameters.
    pub passwords: PasswordHasher,

    /// Stripe client for payments (optional).
    pub stripe: Option<Arc<StripeClient>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let passwords =
            PasswordHasher::new(config.password_memory_kib, config.password_iterations)
                .unwrap_or_else(|e| {
                    tracing::error!(error = %e, "Invalid password hashing parameters, using defaults");
                    PasswordHasher::default()
                });

        // Create Stripe client if configured
        let stripe = config.stripe_api_key.as_ref().and_then(|key| {
            match StripeClient::new(key, &config.stripe_api_base) {
                Ok(client) => {
                    tracing::info!("Stripe integration enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Stripe client");
                    None
                }
            }
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - checkout will not be available");
        }

        if config.stripe_webhook_secret.is_none() {
            tracing::warn!("Stripe webhook secret not configured - webhooks will be refused");
        }

        if config.admin_api_key.is_none() {
            tracing::warn!("Admin API key not configured - admin endpoints are disabled");
        }

        Self {
            store,
            config,
            passwords,
            stripe,
        }
    }

    /// Check if Stripe is configured.
    #[must_use]
    pub fn has_stripe(&self) -> bool {
        self.stripe.is_some()
    }
}
