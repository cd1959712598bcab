//! Common test utilities for jecris integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

use jecris_service::crypto::sign_stripe_payload;
use jecris_service::{create_router, AppState, ServiceConfig};
use jecris_store::MemoryStore;

pub const ADMIN_KEY: &str = "test-admin-key";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const PASSWORD: &str = "hunter22";

/// Header carrying the admin key.
pub fn admin_key_header() -> HeaderName {
    HeaderName::from_static("x-admin-key")
}

/// Header carrying the Stripe webhook signature.
pub fn stripe_signature_header() -> HeaderName {
    HeaderName::from_static("stripe-signature")
}

/// A registered and logged-in user.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestUser {
    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> HeaderValue {
        bearer(&self.token)
    }
}

pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header value")
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The store behind the server, for direct assertions.
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Create a new test harness with a fresh in-memory store and no Stripe API.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a harness whose Stripe client talks to `base_url`.
    pub fn with_stripe(base_url: &str) -> Self {
        let base_url = base_url.to_string();
        Self::with_config(move |config| {
            config.stripe_api_key = Some("sk_test_123".into());
            config.stripe_api_base = base_url;
        })
    }

    /// Create a harness after adjusting the default test config.
    pub fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            jwt_secret: "test-jwt-secret".into(),
            password_memory_kib: 1024,
            password_iterations: 1,
            admin_api_key: Some(ADMIN_KEY.into()),
            stripe_webhook_secret: Some(WEBHOOK_SECRET.into()),
            frontend_url: "http://localhost:5173".into(),
            max_body_bytes: 1024 * 1024,
            ..ServiceConfig::default()
        };
        adjust(&mut config);

        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, store }
    }

    /// Register `email` with the shared test password and log in.
    pub async fn user(&self, email: &str) -> TestUser {
        let response = self
            .server
            .post("/v1/auth/register")
            .json(&json!({ "email": email, "password": PASSWORD }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let id = response.json::<Value>()["data"]["id"]
            .as_str()
            .expect("user id")
            .to_string();

        let token = self.login(email, PASSWORD).await;

        TestUser {
            id,
            email: email.to_string(),
            token,
        }
    }

    /// Log in and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .server
            .post("/v1/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["data"]["token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    /// Add a book through the admin endpoint and return its id.
    pub async fn create_book(&self, title: &str, price_cents: i64, content: &str) -> String {
        let response = self
            .server
            .post("/v1/books")
            .add_header(admin_key_header(), HeaderValue::from_static(ADMIN_KEY))
            .json(&json!({
                "title": title,
                "author": "Test Author",
                "content": content,
                "description": format!("About {title}"),
                "price_cents": price_cents,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["data"]["id"]
            .as_str()
            .expect("book id")
            .to_string()
    }

    /// GET with a bearer token.
    pub async fn get_as(&self, user: &TestUser, path: &str) -> TestResponse {
        self.server
            .get(path)
            .add_header(header::AUTHORIZATION, user.bearer())
            .await
    }

    /// POST JSON with a bearer token.
    pub async fn post_as(&self, user: &TestUser, path: &str, body: &Value) -> TestResponse {
        self.server
            .post(path)
            .add_header(header::AUTHORIZATION, user.bearer())
            .json(body)
            .await
    }

    /// Deliver a webhook payload signed with the test secret.
    pub async fn deliver_webhook(&self, payload: &Value) -> TestResponse {
        let body = payload.to_string();
        let signature = sign_stripe_payload(&body, WEBHOOK_SECRET, chrono::Utc::now().timestamp())
            .expect("sign payload");

        self.server
            .post("/webhooks/stripe")
            .add_header(
                stripe_signature_header(),
                HeaderValue::from_str(&signature).expect("valid header value"),
            )
            .text(body)
            .await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A `checkout.session.completed` event for `user_id` buying `book_ids`.
pub fn checkout_completed(event_id: &str, user_id: &str, book_ids: &[&str], amount: i64) -> Value {
    json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "created": 1_700_000_000,
        "data": {
            "object": {
                "id": format!("cs_test_{event_id}"),
                "object": "checkout.session",
                "payment_status": "paid",
                "amount_total": amount,
                "client_reference_id": user_id,
                "metadata": {
                    "user_id": user_id,
                    "book_ids": book_ids.join(","),
                }
            }
        }
    })
}

/// Content spanning exactly `pages` reader pages.
pub fn content_with_pages(pages: usize) -> String {
    "a".repeat(jecris_core::CHARACTERS_PER_PAGE * pages)
}
