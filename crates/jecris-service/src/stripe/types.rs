//! Stripe wire types, limited to the fields Jecris reads.

use serde::Deserialize;

/// A Checkout session, as returned on creation and embedded in
/// `checkout.session.completed`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// `cs_...` identifier.
    pub id: String,
    /// Hosted payment page. Absent once the session is complete.
    #[serde(default)]
    pub url: Option<String>,
    /// `paid`, `unpaid` or `no_payment_required`.
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Amount charged, in cents.
    #[serde(default)]
    pub amount_total: Option<i64>,
    /// Buyer and book ids written at creation.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Envelope of every webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// `evt_...` identifier. Redeliveries reuse it.
    pub id: String,
    /// e.g. `checkout.session.completed`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Wrapped API object.
    pub data: WebhookEventData,
}

/// The `data` member of a webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    /// Shape depends on the event type.
    pub object: serde_json::Value,
}

/// One book on the payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    /// Product name, the book title.
    pub name: String,
    /// Subtitle under the name.
    pub description: Option<String>,
    /// Price in cents.
    pub unit_amount: i64,
}

/// Body of a non-2xx Stripe response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// `invalid_request_error`, `api_error`, ...
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Machine-readable code, when Stripe sends one.
    #[serde(default)]
    pub code: Option<String>,
}
