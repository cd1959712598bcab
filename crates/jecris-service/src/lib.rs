//! Jecris HTTP API Service.
//!
//! This crate provides the HTTP API for the Jecris book marketplace, including:
//!
//! - Registration, login and bearer-token sessions
//! - The public catalog
//! - Carts, Stripe Checkout sessions and payment history
//! - Personal libraries and the paginated reader
//! - The Stripe webhook that turns completed checkouts into owned books
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **Bearer tokens** - HS256 JWTs issued by `POST /v1/auth/login`
//! 2. **Admin API key** - `X-Admin-Key` header for catalog management

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for the router

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod password;
pub mod response;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::{ConfigError, ServiceConfig};
pub use error::ApiError;
pub use response::ApiResponse;
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
