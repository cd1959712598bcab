//! Checkout reconciliation planning.
//!
//! A checkout session carries the buyer and the purchased books in its
//! metadata. When the provider reports the session as completed, the store
//! credits exactly the books the user does not already own and records the
//! event id so that redelivery of the same event is a no-op.

use std::collections::HashSet;

use serde::Serialize;

use crate::{BookId, UserId};

/// Metadata key holding the buyer's user id.
pub const USER_ID_METADATA_KEY: &str = "user_id";

/// Metadata key holding the comma-separated purchased book ids.
pub const BOOK_IDS_METADATA_KEY: &str = "book_ids";

/// Largest cart that fits in a single provider metadata value (500 chars).
pub const MAX_BOOKS_PER_CHECKOUT: usize = 13;

/// Why checkout metadata could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    /// The metadata object or one of its keys is absent.
    #[error("missing metadata field: {0}")]
    Missing(&'static str),

    /// The user id is not a valid identifier.
    #[error("invalid user id in metadata: {0}")]
    InvalidUserId(String),

    /// One of the book ids is not a valid identifier.
    #[error("invalid book id in metadata: {0}")]
    InvalidBookId(String),

    /// The book list is empty.
    #[error("checkout metadata lists no books")]
    EmptyBookList,
}

/// Buyer and books decoded from a checkout session's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutMetadata {
    /// Buyer.
    pub user_id: UserId,
    /// Purchased books, deduplicated, in listing order.
    pub book_ids: Vec<BookId>,
}

impl CheckoutMetadata {
    /// Decode the metadata object of a checkout session.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError` if a key is missing, an id does not parse, or
    /// the book list is empty.
    pub fn from_json(metadata: Option<&serde_json::Value>) -> Result<Self, MetadataError> {
        let metadata = metadata
            .and_then(serde_json::Value::as_object)
            .ok_or(MetadataError::Missing("metadata"))?;

        let field = |key: &'static str| {
            metadata
                .get(key)
                .and_then(serde_json::Value::as_str)
                .ok_or(MetadataError::Missing(key))
        };

        let raw_user = field(USER_ID_METADATA_KEY)?;
        let user_id = raw_user
            .parse()
            .map_err(|_| MetadataError::InvalidUserId(raw_user.to_string()))?;

        let book_ids = decode_book_ids(field(BOOK_IDS_METADATA_KEY)?)?;

        Ok(Self { user_id, book_ids })
    }
}

/// Join book ids for storage in a single metadata value.
#[must_use]
pub fn encode_book_ids(book_ids: &[BookId]) -> String {
    book_ids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a comma-separated book id list, dropping duplicates.
///
/// # Errors
///
/// Returns `MetadataError::InvalidBookId` for an unparseable entry and
/// `MetadataError::EmptyBookList` when nothing is listed.
pub fn decode_book_ids(raw: &str) -> Result<Vec<BookId>, MetadataError> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: BookId = part
            .parse()
            .map_err(|_| MetadataError::InvalidBookId(part.to_string()))?;
        if seen.insert(id) {
            ids.push(id);
        }
    }

    if ids.is_empty() {
        return Err(MetadataError::EmptyBookList);
    }
    Ok(ids)
}

/// The books from `purchased` the user does not already own, in order.
#[must_use]
pub fn books_to_credit(owned: &HashSet<BookId>, purchased: &[BookId]) -> Vec<BookId> {
    let mut seen = HashSet::new();
    purchased
        .iter()
        .copied()
        .filter(|id| !owned.contains(id) && seen.insert(*id))
        .collect()
}

/// A completed payment to reconcile against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    /// External event id, the idempotency key.
    pub payment_id: String,
    /// Buyer.
    pub user_id: UserId,
    /// Purchased books.
    pub book_ids: Vec<BookId>,
    /// Amount charged in cents.
    pub amount_cents: i64,
}

/// Result of reconciling a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PurchaseOutcome {
    /// First delivery: library and cart were updated.
    Applied {
        /// Books newly added to the library.
        added: Vec<BookId>,
        /// Cart rows removed.
        cart_removed: u64,
    },
    /// The payment id was already recorded; nothing changed.
    Duplicate,
}

impl PurchaseOutcome {
    /// Whether this delivery was a redelivery.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate)
    }

    /// Number of books credited by this delivery.
    #[must_use]
    pub fn books_added(&self) -> usize {
        match self {
            Self::Applied { added, .. } => added.len(),
            Self::Duplicate => 0,
        }
    }
}
