//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, books, cart, health, library, payments, read, users, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/books`, `GET /v1/books/:id` - Catalog
/// - `GET /v1/authors` - Authors
///
/// ## Auth
/// - `POST /v1/auth/register`, `POST /v1/auth/login`
/// - `POST /v1/auth/check-email`, `POST /v1/auth/logout`
///
/// ## Bearer token
/// - `GET /v1/users/me`
/// - `GET|POST|DELETE /v1/cart`, `DELETE /v1/cart/:book_id`
/// - `GET|POST /v1/library`
/// - `GET /v1/read/:book_id/:page`, `PUT /v1/read/progress`
/// - `POST /v1/payments/checkout`, `GET /v1/payments`
///
/// ## Admin key
/// - `POST /v1/books` - Add a book
/// - `GET /v1/users` - List users
///
/// ## Webhooks (Signature verification)
/// - `POST /webhooks/stripe` - Stripe webhooks
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/check-email", post(auth::check_email))
        .route("/auth/logout", post(auth::logout))
        // Users
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::get_me))
        // Catalog
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/:id", get(books::get_book))
        .route("/authors", get(books::list_authors))
        // Cart
        .route(
            "/cart",
            get(cart::get_cart)
                .post(cart::add_to_cart)
                .delete(cart::clear_cart),
        )
        .route("/cart/:book_id", delete(cart::remove_from_cart))
        // Library and reader
        .route(
            "/library",
            get(library::list_library).post(library::claim_book),
        )
        .route("/read/progress", put(read::save_progress))
        .route("/read/:book_id/:page", get(read::get_page))
        // Payments
        .route("/payments", get(payments::list_payments))
        .route("/payments/checkout", post(payments::create_checkout))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - controlled by Stripe)
        .route("/webhooks/stripe", post(webhooks::stripe_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
