//! Core types and utilities for Jecris.
//!
//! This crate provides the foundational types used throughout the Jecris
//! marketplace:
//!
//! - **Identifiers**: `UserId`, `BookId`, `AuthorId`, `EntryId`, `PaymentRecordId`
//! - **Catalog**: `Book`, `Author`, `BookSummary`
//! - **Ownership**: `CartItem`, `LibraryEntry`, `PaymentRecord`
//! - **Reading**: `Page`, `CHARACTERS_PER_PAGE`
//! - **Checkout**: `CheckoutMetadata`, `Purchase`, `PurchaseOutcome`
//!
//! # Money
//!
//! Prices are stored as `i64` minor units (cents). A price of `0` marks a free
//! book, which can be claimed without going through the payment provider.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod book;
pub mod checkout;
pub mod error;
pub mod ids;
pub mod library;
pub mod pagination;
pub mod user;

pub use book::{Author, Book, BookSummary, NewBook};
pub use checkout::{
    books_to_credit, decode_book_ids, encode_book_ids, CheckoutMetadata, MetadataError, Purchase,
    PurchaseOutcome, BOOK_IDS_METADATA_KEY, MAX_BOOKS_PER_CHECKOUT, USER_ID_METADATA_KEY,
};
pub use error::{CoreError, Result};
pub use ids::{AuthorId, BookId, EntryId, IdError, PaymentRecordId, UserId};
pub use library::{CartItem, CartLine, LibraryBook, LibraryEntry, PaymentRecord};
pub use pagination::{page, pages_for_chars, total_pages, Page, PageError, CHARACTERS_PER_PAGE};
pub use user::{normalize_email, validate_password, NewUser, User, MIN_PASSWORD_LENGTH};
