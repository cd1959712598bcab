//! Stripe integration for book purchases.
//!
//! Stripe handles:
//! - Hosted Checkout sessions built from a user's cart
//! - `checkout.session.completed` webhooks that credit the purchased books

pub mod client;
pub mod types;

pub use client::{CheckoutRequest, StripeClient, StripeError};
pub use types::*;
