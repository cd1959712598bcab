//! Stripe API client implementation.

use reqwest::Client;
use std::time::Duration;

use jecris_core::{encode_book_ids, BookId, UserId, BOOK_IDS_METADATA_KEY, USER_ID_METADATA_KEY};

use super::types::{CheckoutLine, CheckoutSession, StripeErrorResponse};

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Everything needed to open a Checkout session for a cart.
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    /// Buyer, sent as `client_reference_id` and metadata.
    pub user_id: UserId,
    /// Purchased books, sent as comma-joined metadata.
    pub book_ids: &'a [BookId],
    /// One line per book.
    pub lines: &'a [CheckoutLine],
    /// ISO currency code for every line.
    pub currency: &'a str,
    /// Redirect after payment.
    pub success_url: &'a str,
    /// Redirect after cancellation.
    pub cancel_url: &'a str,
    /// Prefilled email on the payment page.
    pub customer_email: Option<&'a str>,
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    /// * `base_url` - API root, normally `https://api.stripe.com/v1`
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, StripeError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(StripeError::Configuration("API key is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StripeError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a Checkout session for the given cart.
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, StripeError> {
        let params = checkout_params(request);

        tracing::debug!(
            user_id = %request.user_id,
            lines = request.lines.len(),
            "Creating Stripe checkout session"
        );

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}

/// Form-encoded parameters for `POST /checkout/sessions`.
fn checkout_params(request: &CheckoutRequest<'_>) -> Vec<(String, String)> {
    let user_id = request.user_id.to_string();

    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.to_string()),
        ("cancel_url".to_string(), request.cancel_url.to_string()),
        ("client_reference_id".to_string(), user_id.clone()),
        (format!("metadata[{USER_ID_METADATA_KEY}]"), user_id),
        (
            format!("metadata[{BOOK_IDS_METADATA_KEY}]"),
            encode_book_ids(request.book_ids),
        ),
    ];

    for (i, line) in request.lines.iter().enumerate() {
        let prefix = format!("line_items[{i}]");
        params.push((
            format!("{prefix}[price_data][currency]"),
            request.currency.to_string(),
        ));
        params.push((
            format!("{prefix}[price_data][product_data][name]"),
            line.name.clone(),
        ));
        if let Some(description) = line.description.as_deref().filter(|d| !d.is_empty()) {
            params.push((
                format!("{prefix}[price_data][product_data][description]"),
                description.to_string(),
            ));
        }
        params.push((
            format!("{prefix}[price_data][unit_amount]"),
            line.unit_amount.to_string(),
        ));
        params.push((format!("{prefix}[quantity]"), "1".to_string()));
    }

    if let Some(email) = request.customer_email {
        params.push(("customer_email".to_string(), email.to_string()));
    }

    params
}
