//! Catalog integration tests.

mod common;

use axum::http::{HeaderValue, StatusCode};
use common::{admin_key_header, content_with_pages, TestHarness, ADMIN_KEY};
use serde_json::{json, Value};

#[tokio::test]
async fn created_books_are_listed() {
    let harness = TestHarness::new();
    harness.create_book("Zadig", 0, &content_with_pages(1)).await;
    harness.create_book("Candide", 999, &content_with_pages(3)).await;

    let response = harness.server.get("/v1/books").await;
    response.assert_status_ok();

    let books = response.json::<Value>()["data"].as_array().cloned().unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["title"], "Candide");
    assert_eq!(books[0]["is_free"], false);
    assert_eq!(books[0]["total_pages"], 3);
    assert_eq!(books[1]["is_free"], true);
    assert!(books[0].get("content").is_none());
}

#[tokio::test]
async fn book_details_omit_content() {
    let harness = TestHarness::new();
    let book_id = harness.create_book("Candide", 999, "Il y avait en Westphalie").await;

    let response = harness.server.get(&format!("/v1/books/{book_id}")).await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["title"], "Candide");
    assert_eq!(body["data"]["author"], "Test Author");
    assert_eq!(body["data"]["price_cents"], 999);
    assert_eq!(body["data"]["total_pages"], 1);
    assert!(body["data"].get("content").is_none());
}

#[tokio::test]
async fn unknown_book_is_not_found() {
    let harness = TestHarness::new();

    harness
        .server
        .get(&format!("/v1/books/{}", uuid::Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    harness
        .server
        .get("/v1/books/not-a-uuid")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn creating_books_requires_admin_key() {
    let harness = TestHarness::new();
    let body = json!({ "title": "Candide", "author": "Voltaire", "content": "text" });

    harness
        .server
        .post("/v1/books")
        .json(&body)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    harness
        .server
        .post("/v1/books")
        .add_header(admin_key_header(), HeaderValue::from_static("wrong-key"))
        .json(&body)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_books_are_rejected() {
    let harness = TestHarness::new();

    for body in [
        json!({ "title": " ", "author": "Voltaire", "content": "text" }),
        json!({ "title": "Candide", "author": "", "content": "text" }),
        json!({ "title": "Candide", "author": "Voltaire", "content": "" }),
        json!({ "title": "Candide", "author": "Voltaire", "content": "text", "price_cents": -1 }),
    ] {
        harness
            .server
            .post("/v1/books")
            .add_header(admin_key_header(), HeaderValue::from_static(ADMIN_KEY))
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn duplicate_title_is_a_conflict() {
    let harness = TestHarness::new();
    harness.create_book("Candide", 0, "text").await;

    harness
        .server
        .post("/v1/books")
        .add_header(admin_key_header(), HeaderValue::from_static(ADMIN_KEY))
        .json(&json!({ "title": "Candide", "author": "Someone Else", "content": "other" }))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn authors_are_shared_between_books() {
    let harness = TestHarness::new();
    harness.create_book("Candide", 0, "text").await;
    harness.create_book("Zadig", 0, "text").await;

    let response = harness.server.get("/v1/authors").await;
    response.assert_status_ok();

    let authors = response.json::<Value>()["data"].as_array().cloned().unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0]["name"], "Test Author");
}
