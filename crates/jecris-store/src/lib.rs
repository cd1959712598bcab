//! Storage layer for Jecris.
//!
//! This crate provides persistent storage for users, the catalog, carts,
//! libraries and payment records.
//!
//! # Backends
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`. Uniqueness invariants (one library
//!   entry per user and book, one payment record per provider payment id) are
//!   enforced by table constraints.
//! - [`MemoryStore`]: a single-lock in-memory implementation used for tests
//!   and for running the service without a database.
//!
//! # Example
//!
//! ```no_run
//! use jecris_store::{MemoryStore, Store};
//! use jecris_core::NewUser;
//!
//! # async fn example() -> jecris_store::Result<()> {
//! let store = MemoryStore::new();
//! let user = NewUser::new("reader@example.com", "$argon2id$...".into()).unwrap();
//! let user = store.create_user(&user).await?;
//! let library = store.list_library(&user.id).await?;
//! assert!(library.is_empty());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use jecris_core::{
    Author, Book, BookId, BookSummary, CartItem, CartLine, LibraryBook, LibraryEntry, NewBook,
    NewUser, PaymentRecord, Purchase, PurchaseOutcome, User, UserId,
};

/// The storage trait defining all database operations.
///
/// Handlers hold an `Arc<dyn Store>`, so the backend is chosen once at start.
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email is already registered.
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Get a user by (normalized) email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// List every user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_users(&self) -> Result<Vec<User>>;

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Add a book, creating its author if the name is new.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the title already exists.
    async fn create_book(&self, book: &NewBook) -> Result<Book>;

    /// Get a book with its content.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_book(&self, book_id: &BookId) -> Result<Option<Book>>;

    /// List catalog summaries ordered by title.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_books(&self) -> Result<Vec<BookSummary>>;

    /// List authors ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_authors(&self) -> Result<Vec<Author>>;

    // =========================================================================
    // Cart
    // =========================================================================

    /// List a user's cart, oldest item first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartLine>>;

    /// Put a book in a user's cart.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the user or book doesn't exist.
    /// - `StoreError::Conflict` if the book is already in the cart.
    async fn add_to_cart(&self, user_id: &UserId, book_id: &BookId) -> Result<CartItem>;

    /// Remove one book from a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the book is not in the cart.
    async fn remove_from_cart(&self, user_id: &UserId, book_id: &BookId) -> Result<()>;

    /// Empty a user's cart, returning the number of removed items.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn clear_cart(&self, user_id: &UserId) -> Result<u64>;

    // =========================================================================
    // Library
    // =========================================================================

    /// List a user's owned books, most recently added first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_library(&self, user_id: &UserId) -> Result<Vec<LibraryBook>>;

    /// Get the library entry for a user and book, if owned.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_library_entry(
        &self,
        user_id: &UserId,
        book_id: &BookId,
    ) -> Result<Option<LibraryEntry>>;

    /// Add a book to a user's library without payment.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the user or book doesn't exist.
    /// - `StoreError::Conflict` if the user already owns the book.
    async fn add_to_library(&self, user_id: &UserId, book_id: &BookId) -> Result<LibraryEntry>;

    /// Save reading progress on an owned book.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user does not own the book.
    async fn update_progress(
        &self,
        user_id: &UserId,
        book_id: &BookId,
        last_page_read: i32,
    ) -> Result<LibraryEntry>;

    // =========================================================================
    // Payments
    // =========================================================================

    /// List a user's payment records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_payments(&self, user_id: &UserId) -> Result<Vec<PaymentRecord>>;

    /// Check whether a provider payment id has been recorded.
    ///
    /// Read-only lookup for tests and diagnostics. Reconciliation does not
    /// call it: `complete_purchase` claims the id inside its own transaction,
    /// so a check made before that call could race with another delivery.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn has_payment(&self, payment_id: &str) -> Result<bool>;

    /// Reconcile a completed payment atomically.
    ///
    /// If `purchase.payment_id` is already recorded nothing changes and
    /// `PurchaseOutcome::Duplicate` is returned. Otherwise the purchased books
    /// the user does not own are added to the library, the purchased books are
    /// removed from the cart, and the payment is recorded, all in one unit.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user or a book doesn't exist; no
    /// state changes in that case.
    async fn complete_purchase(&self, purchase: &Purchase) -> Result<PurchaseOutcome>;
}
