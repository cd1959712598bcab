//! Reader handlers: paginated content and saved progress.

use std::num::IntErrorKind;
use std::sync::Arc;

use axum::extract::State;
use serde::{Deserialize, Serialize};

use jecris_core::{page, Book, BookId, LibraryEntry, UserId};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::response::ApiResponse;
use crate::state::AppState;

/// One page of an owned book.
#[derive(Debug, Serialize)]
pub struct PageResponse {
    /// Book ID.
    pub book_id: BookId,
    /// Book title.
    pub title: String,
    /// 1-based page number.
    pub page_number: usize,
    /// Total pages in the book.
    pub total_pages: usize,
    /// Text of the page.
    pub content: String,
    /// Whether a following page exists.
    pub has_next_page: bool,
    /// Whether a preceding page exists.
    pub has_previous_page: bool,
}

/// Progress update.
#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    /// Book being read.
    pub book_id: BookId,
    /// Page to remember.
    pub last_page_read: i64,
}

/// Get page `page` of an owned book.
pub async fn get_page(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiPath((book_id, raw_page)): ApiPath<(BookId, String)>,
) -> Result<ApiResponse<PageResponse>, ApiError> {
    let page_number = parse_page_number(&raw_page)?;

    let book = state
        .store
        .get_book(&book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book not found: {book_id}")))?;

    require_owned(&state, &auth.user_id, &book.id).await?;

    let page = page(&book.content, page_number).map_err(jecris_core::CoreError::from)?;

    Ok(ApiResponse::ok(
        "Page retrieved",
        PageResponse {
            book_id: book.id,
            title: book.title.clone(),
            page_number: page.number,
            total_pages: page.total_pages,
            content: page.content.to_string(),
            has_next_page: page.has_next(),
            has_previous_page: page.has_previous(),
        },
    ))
}

/// Save the last page read in an owned book.
pub async fn save_progress(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ApiJson(body): ApiJson<ProgressRequest>,
) -> Result<ApiResponse<LibraryEntry>, ApiError> {
    require_owned(&state, &auth.user_id, &body.book_id).await?;

    let book = state
        .store
        .get_book(&body.book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book not found: {}", body.book_id)))?;

    let last_page_read = checked_page(&book, body.last_page_read)?;

    let entry = state
        .store
        .update_progress(&auth.user_id, &book.id, last_page_read)
        .await?;

    tracing::debug!(
        user_id = %auth.user_id,
        book_id = %book.id,
        last_page_read,
        "Reading progress saved"
    );

    Ok(ApiResponse::ok("Progress saved", entry))
}

async fn require_owned(
    state: &AppState,
    user_id: &UserId,
    book_id: &BookId,
) -> Result<LibraryEntry, ApiError> {
    state
        .store
        .get_library_entry(user_id, book_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("You do not own this book".into()))
}

/// Parse the page path segment.
///
/// Integers too large for `i64` saturate so they fall out of range (404)
/// rather than failing to parse (400).
fn parse_page_number(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(n) => Ok(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(ApiError::BadRequest(format!(
                "page must be an integer, got {raw:?}"
            ))),
        },
    }
}

/// Validate a progress page against the book's length.
fn checked_page(book: &Book, requested: i64) -> Result<i32, ApiError> {
    let total = book.total_pages();
    let out_of_range = || {
        ApiError::BadRequest(format!(
            "page {requested} is outside 1..={total} for this book"
        ))
    };

    let in_range = usize::try_from(requested)
        .ok()
        .filter(|p| (1..=total).contains(p))
        .ok_or_else(out_of_range)?;

    i32::try_from(in_range).map_err(|_| out_of_range())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jecris_core::{AuthorId, CHARACTERS_PER_PAGE};

    fn book_with_chars(chars: usize) -> Book {
        Book {
            id: BookId::generate(),
            title: "Sample".into(),
            author_id: AuthorId::generate(),
            author_name: "Anon".into(),
            price_cents: 0,
            content: "x".repeat(chars),
            description: String::new(),
            image: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn progress_page_must_be_inside_book() {
        let book = book_with_chars(CHARACTERS_PER_PAGE * 2 + 1);
        assert_eq!(checked_page(&book, 1).unwrap(), 1);
        assert_eq!(checked_page(&book, 3).unwrap(), 3);
        assert!(checked_page(&book, 0).is_err());
        assert!(checked_page(&book, 4).is_err());
        assert!(checked_page(&book, -2).is_err());
    }

    #[test]
    fn page_numbers_saturate_instead_of_failing() {
        assert_eq!(parse_page_number("2").unwrap(), 2);
        assert_eq!(parse_page_number("-1").unwrap(), -1);
        assert_eq!(parse_page_number("99999999999999999999").unwrap(), i64::MAX);
        assert_eq!(parse_page_number("-99999999999999999999").unwrap(), i64::MIN);
        assert!(matches!(
            parse_page_number("two"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(parse_page_number("1.5"), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn empty_book_accepts_no_progress() {
        assert!(checked_page(&book_with_chars(0), 1).is_err());
    }
}
