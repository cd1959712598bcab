//! Library and reader integration tests.

mod common;

use axum::http::{header, StatusCode};
use common::{content_with_pages, TestHarness, TestUser};
use serde_json::{json, Value};

async fn claim(harness: &TestHarness, user: &TestUser, book_id: &str) -> axum_test::TestResponse {
    harness
        .post_as(user, "/v1/library", &json!({ "book_id": book_id }))
        .await
}

async fn save_progress(
    harness: &TestHarness,
    user: &TestUser,
    book_id: &str,
    page: i64,
) -> axum_test::TestResponse {
    harness
        .server
        .put("/v1/read/progress")
        .add_header(header::AUTHORIZATION, user.bearer())
        .json(&json!({ "book_id": book_id, "last_page_read": page }))
        .await
}

#[tokio::test]
async fn free_book_is_claimed_without_payment() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;
    let book = harness.create_book("Candide", 0, &content_with_pages(2)).await;

    let response = claim(&harness, &user, &book).await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["data"]["last_page_read"], 1);

    let library = harness.get_as(&user, "/v1/library").await;
    library.assert_status_ok();
    let books = library.json::<Value>()["data"].as_array().cloned().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["book_id"], book.as_str());
    assert_eq!(books[0]["total_pages"], 2);
}

#[tokio::test]
async fn paid_book_cannot_be_claimed() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;
    let book = harness.create_book("Candide", 1, "text").await;

    let response = claim(&harness, &user, &book).await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    assert_eq!(response.json::<Value>()["code"], "payment_required");

    let library = harness.get_as(&user, "/v1/library").await;
    assert!(library.json::<Value>()["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn claiming_twice_is_a_conflict() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;
    let book = harness.create_book("Candide", 0, "text").await;

    claim(&harness, &user, &book).await.assert_status(StatusCode::CREATED);
    claim(&harness, &user, &book).await.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn claiming_unknown_book_is_not_found() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;

    claim(&harness, &user, &uuid::Uuid::new_v4().to_string())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pages_reassemble_the_book() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;

    // Multi-byte characters across page boundaries, with a short last page
    let content: String = "é🦀a".repeat(700);
    let book = harness.create_book("Candide", 0, &content).await;
    claim(&harness, &user, &book).await.assert_status(StatusCode::CREATED);

    let mut rebuilt = String::new();
    let mut page = 1;
    loop {
        let response = harness.get_as(&user, &format!("/v1/read/{book}/{page}")).await;
        response.assert_status_ok();
        let data = response.json::<Value>()["data"].clone();

        assert_eq!(data["page_number"], page);
        assert_eq!(data["total_pages"], 3);
        assert_eq!(data["has_previous_page"], page > 1);
        rebuilt.push_str(data["content"].as_str().unwrap());

        if data["has_next_page"] == false {
            break;
        }
        page += 1;
    }

    assert_eq!(page, 3);
    assert_eq!(rebuilt, content);
}

#[tokio::test]
async fn out_of_range_pages_are_not_found() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;
    let book = harness.create_book("Candide", 0, &content_with_pages(2)).await;
    claim(&harness, &user, &book).await.assert_status(StatusCode::CREATED);

    for page in [
        "0",
        "3",
        "-1",
        "9223372036854775807",
        "99999999999999999999",
        "-99999999999999999999",
    ] {
        harness
            .get_as(&user, &format!("/v1/read/{book}/{page}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn non_numeric_pages_are_bad_requests() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;
    let book = harness.create_book("Candide", 0, &content_with_pages(2)).await;
    claim(&harness, &user, &book).await.assert_status(StatusCode::CREATED);

    for page in ["first", "1.5", "1e3"] {
        harness
            .get_as(&user, &format!("/v1/read/{book}/{page}"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn reading_requires_ownership() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;
    let book = harness.create_book("Candide", 1299, &content_with_pages(2)).await;

    harness
        .get_as(&user, &format!("/v1/read/{book}/1"))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    harness
        .get_as(&user, &format!("/v1/read/{}/1", uuid::Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn progress_is_saved_within_bounds() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;
    let book = harness.create_book("Candide", 0, &content_with_pages(3)).await;
    claim(&harness, &user, &book).await.assert_status(StatusCode::CREATED);

    let saved = save_progress(&harness, &user, &book, 3).await;
    saved.assert_status_ok();
    assert_eq!(saved.json::<Value>()["data"]["last_page_read"], 3);

    save_progress(&harness, &user, &book, 0)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    save_progress(&harness, &user, &book, 4)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let library = harness.get_as(&user, "/v1/library").await;
    assert_eq!(library.json::<Value>()["data"][0]["last_page_read"], 3);
}

#[tokio::test]
async fn progress_requires_ownership() {
    let harness = TestHarness::new();
    let user = harness.user("reader@example.com").await;
    let book = harness.create_book("Candide", 1299, &content_with_pages(3)).await;

    save_progress(&harness, &user, &book, 1)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
