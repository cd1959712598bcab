//! Per-user ownership state: cart, library and payment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BookId, EntryId, PaymentRecordId, UserId};

/// A book sitting in a user's cart, waiting for checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Row ID.
    pub id: EntryId,
    /// Owner of the cart.
    pub user_id: UserId,
    /// Book in the cart.
    pub book_id: BookId,
    /// When it was added.
    pub added_at: DateTime<Utc>,
}

/// A cart item joined with the book it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Book ID.
    pub book_id: BookId,
    /// Book title.
    pub title: String,
    /// Author display name.
    pub author: String,
    /// Price in cents at the time of listing.
    pub price_cents: i64,
    /// When it was added to the cart.
    pub added_at: DateTime<Utc>,
}

/// A record that a user owns a book and may read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// Row ID.
    pub id: EntryId,
    /// Owner.
    pub user_id: UserId,
    /// Owned book.
    pub book_id: BookId,
    /// Last page the reader saved (1-based).
    pub last_page_read: i32,
    /// When the book entered the library.
    pub added_at: DateTime<Utc>,
}

impl LibraryEntry {
    /// A fresh entry starting at page 1.
    #[must_use]
    pub fn new(user_id: UserId, book_id: BookId) -> Self {
        Self {
            id: EntryId::generate(),
            user_id,
            book_id,
            last_page_read: 1,
            added_at: Utc::now(),
        }
    }
}

/// A library entry joined with its book, as shown on the bookshelf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryBook {
    /// Book ID.
    pub book_id: BookId,
    /// Title.
    pub title: String,
    /// Author display name.
    pub author: String,
    /// Short blurb.
    pub description: String,
    /// Cover image URL.
    pub image: Option<String>,
    /// Price in cents.
    pub price_cents: i64,
    /// Last page the reader saved.
    pub last_page_read: i32,
    /// Number of reader pages.
    pub total_pages: usize,
    /// When the book entered the library.
    pub added_at: DateTime<Utc>,
}

/// A payment confirmed by the provider, keyed by the provider's event id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Row ID.
    pub id: PaymentRecordId,
    /// External idempotency key (webhook event id).
    pub payment_id: String,
    /// Paying user.
    pub user_id: UserId,
    /// Amount charged in cents.
    pub amount_cents: i64,
    /// When the payment was recorded.
    pub created_at: DateTime<Utc>,
}
