//! Registration, login and token handling tests.

mod common;

use axum::http::{header, HeaderValue, StatusCode};
use common::{bearer, TestHarness, PASSWORD};
use serde_json::{json, Value};

#[tokio::test]
async fn health_reports_service() {
    let harness = TestHarness::new();

    let response = harness.server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "jecris");
    assert_eq!(body["payments_enabled"], false);
    assert_eq!(body["webhooks_enabled"], true);
}

#[tokio::test]
async fn register_returns_user_without_hash() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/auth/register")
        .json(&json!({ "email": "  Reader@Example.com ", "password": PASSWORD }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["email"], "reader@example.com");
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let harness = TestHarness::new();
    harness.user("reader@example.com").await;

    let response = harness
        .server
        .post("/v1/auth/register")
        .json(&json!({ "email": "READER@example.com", "password": "another-password" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], "conflict");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn register_validates_input() {
    let harness = TestHarness::new();

    for body in [
        json!({ "email": "not-an-email", "password": PASSWORD }),
        json!({ "email": "reader@example.com", "password": "short" }),
        json!({ "password": PASSWORD }),
    ] {
        harness
            .server
            .post("/v1/auth/register")
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn malformed_json_uses_error_envelope() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/auth/register")
        .add_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .text("{not json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["status"], "error");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let harness = TestHarness::new();
    harness.user("reader@example.com").await;

    let wrong_password = harness
        .server
        .post("/v1/auth/login")
        .json(&json!({ "email": "reader@example.com", "password": "wrong-password" }))
        .await;
    let unknown_email = harness
        .server
        .post("/v1/auth/login")
        .json(&json!({ "email": "nobody@example.com", "password": PASSWORD }))
        .await;
    let invalid_email = harness
        .server
        .post("/v1/auth/login")
        .json(&json!({ "email": "not-an-email", "password": PASSWORD }))
        .await;

    for response in [&wrong_password, &unknown_email, &invalid_email] {
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
    assert_eq!(
        wrong_password.json::<Value>()["message"],
        unknown_email.json::<Value>()["message"]
    );
}

#[tokio::test]
async fn login_token_opens_profile() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;

    let response = harness.get_as(&user, "/v1/users/me").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["id"], user.id);
    assert_eq!(body["data"]["email"], "reader@example.com");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/users/me").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["code"], "unauthorized");
}

#[tokio::test]
async fn non_bearer_scheme_is_unauthorized() {
    let harness = TestHarness::new();

    harness
        .server
        .get("/v1/users/me")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_token_is_forbidden() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/users/me")
        .add_header(header::AUTHORIZATION, bearer("not.a.token"))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["code"], "invalid_token");
}

#[tokio::test]
async fn token_from_another_secret_is_forbidden() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;

    let other = TestHarness::with_config(|config| config.jwt_secret = "other-secret".into());

    other
        .get_as(&user, "/v1/users/me")
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn check_email_reports_availability() {
    let harness = TestHarness::new();
    harness.user("taken@example.com").await;

    let taken = harness
        .server
        .post("/v1/auth/check-email")
        .json(&json!({ "email": "Taken@example.com" }))
        .await;
    taken.assert_status_ok();
    assert_eq!(taken.json::<Value>()["data"]["available"], false);

    let free = harness
        .server
        .post("/v1/auth/check-email")
        .json(&json!({ "email": "free@example.com" }))
        .await;
    free.assert_status_ok();
    assert_eq!(free.json::<Value>()["data"]["available"], true);

    harness
        .server
        .post("/v1/auth/check-email")
        .json(&json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_is_acknowledged() {
    let harness = TestHarness::new();

    let response = harness.server.post("/v1/auth/logout").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "success");
}

#[tokio::test]
async fn listing_users_requires_admin_key() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;

    harness
        .get_as(&user, "/v1/users")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let response = harness
        .server
        .get("/v1/users")
        .add_header(
            common::admin_key_header(),
            HeaderValue::from_static(common::ADMIN_KEY),
        )
        .await;
    response.assert_status_ok();

    let users = response.json::<Value>()["data"].as_array().cloned().unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0].get("password_hash").is_none());
}
