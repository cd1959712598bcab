//! PostgreSQL storage implementation.
//!
//! Queries are checked at runtime (`sqlx::query_as` with `FromRow` rows), so the
//! crate builds without a live database. The schema lives in `migrations/` and
//! is applied by [`PgStore::migrate`].

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use jecris_core::{
    books_to_credit, pages_for_chars, Author, Book, BookId, BookSummary, CartItem, CartLine,
    LibraryBook, LibraryEntry, NewBook, NewUser, PaymentRecord, Purchase,
    PurchaseOutcome, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::Store;

/// PostgreSQL-backed storage implementation.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be established.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

/// Map a failed write, turning constraint violations into domain errors.
fn write_error(err: sqlx::Error, on_conflict: impl FnOnce() -> StoreError) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return on_conflict();
        }
        if db.is_foreign_key_violation() {
            return StoreError::NotFound {
                entity: "referenced row",
                id: db.constraint().unwrap_or("unknown").to_string(),
            };
        }
    }
    err.into()
}

fn pages(content_chars: i32) -> usize {
    pages_for_chars(usize::try_from(content_chars).unwrap_or(0))
}

// ============================================================================
// Row types
// ============================================================================

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id.into(),
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct AuthorRow {
    id: Uuid,
    name: String,
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
        }
    }
}

#[derive(FromRow)]
struct BookRow {
    id: Uuid,
    title: String,
    author_id: Uuid,
    author_name: String,
    price_cents: i64,
    content: String,
    description: String,
    image: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id.into(),
            title: row.title,
            author_id: row.author_id.into(),
            author_name: row.author_name,
            price_cents: row.price_cents,
            content: row.content,
            description: row.description,
            image: row.image,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct BookSummaryRow {
    id: Uuid,
    title: String,
    author_id: Uuid,
    author_name: String,
    price_cents: i64,
    description: String,
    image: Option<String>,
    content_chars: i32,
    created_at: DateTime<Utc>,
}

impl From<BookSummaryRow> for BookSummary {
    fn from(row: BookSummaryRow) -> Self {
        Self {
            id: row.id.into(),
            title: row.title,
            author_id: row.author_id.into(),
            author: row.author_name,
            price_cents: row.price_cents,
            is_free: row.price_cents == 0,
            description: row.description,
            image: row.image,
            total_pages: pages(row.content_chars),
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct CartItemRow {
    id: Uuid,
    user_id: Uuid,
    book_id: Uuid,
    added_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id.into(),
            user_id: row.user_id.into(),
            book_id: row.book_id.into(),
            added_at: row.added_at,
        }
    }
}

#[derive(FromRow)]
struct CartLineRow {
    book_id: Uuid,
    title: String,
    author_name: String,
    price_cents: i64,
    added_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            book_id: row.book_id.into(),
            title: row.title,
            author: row.author_name,
            price_cents: row.price_cents,
            added_at: row.added_at,
        }
    }
}

#[derive(FromRow)]
struct LibraryEntryRow {
    id: Uuid,
    user_id: Uuid,
    book_id: Uuid,
    last_page_read: i32,
    added_at: DateTime<Utc>,
}

impl From<LibraryEntryRow> for LibraryEntry {
    fn from(row: LibraryEntryRow) -> Self {
        Self {
            id: row.id.into(),
            user_id: row.user_id.into(),
            book_id: row.book_id.into(),
            last_page_read: row.last_page_read,
            added_at: row.added_at,
        }
    }
}

#[derive(FromRow)]
struct LibraryBookRow {
    book_id: Uuid,
    title: String,
    author_name: String,
    description: String,
    image: Option<String>,
    price_cents: i64,
    last_page_read: i32,
    content_chars: i32,
    added_at: DateTime<Utc>,
}

impl From<LibraryBookRow> for LibraryBook {
    fn from(row: LibraryBookRow) -> Self {
        Self {
            book_id: row.book_id.into(),
            title: row.title,
            author: row.author_name,
            description: row.description,
            image: row.image,
            price_cents: row.price_cents,
            last_page_read: row.last_page_read,
            total_pages: pages(row.content_chars),
            added_at: row.added_at,
        }
    }
}

#[derive(FromRow)]
struct PaymentRow {
    id: Uuid,
    payment_id: String,
    user_id: Uuid,
    amount_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<PaymentRow> for PaymentRecord {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id.into(),
            payment_id: row.payment_id,
            user_id: row.user_id.into(),
            amount_cents: row.amount_cents,
            created_at: row.created_at,
        }
    }
}

const BOOK_COLUMNS: &str = "b.id, b.title, b.author_id, a.name AS author_name, b.price_cents, \
     b.content, b.description, b.image, b.created_at";

#[async_trait]
impl Store for PgStore {
    // =========================================================================
    // Users
    // =========================================================================

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, email, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            write_error(e, || {
                StoreError::Conflict(format!("email already registered: {}", user.email))
            })
        })?;

        Ok(row.into())
    }

    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, created_at FROM users ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    async fn create_book(&self, book: &NewBook) -> Result<Book> {
        let mut tx = self.pool.begin().await?;

        // Upsert so that the existing row is returned when the name is taken.
        let author: AuthorRow = sqlx::query_as(
            "INSERT INTO authors (id, name) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(&book.author)
        .fetch_one(&mut *tx)
        .await?;

        let id = Uuid::new_v4();
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO books (id, title, author_id, price_cents, content, description, image) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING created_at",
        )
        .bind(id)
        .bind(&book.title)
        .bind(author.id)
        .bind(book.price_cents)
        .bind(&book.content)
        .bind(&book.description)
        .bind(&book.image)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            write_error(e, || {
                StoreError::Conflict(format!("title already exists: {}", book.title))
            })
        })?;

        tx.commit().await?;

        Ok(Book {
            id: id.into(),
            title: book.title.clone(),
            author_id: author.id.into(),
            author_name: author.name,
            price_cents: book.price_cents,
            content: book.content.clone(),
            description: book.description.clone(),
            image: book.image.clone(),
            created_at,
        })
    }

    async fn get_book(&self, book_id: &BookId) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(&format!(
            "SELECT {BOOK_COLUMNS} FROM books b JOIN authors a ON a.id = b.author_id \
             WHERE b.id = $1"
        ))
        .bind(book_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_books(&self) -> Result<Vec<BookSummary>> {
        let rows: Vec<BookSummaryRow> = sqlx::query_as(
            "SELECT b.id, b.title, b.author_id, a.name AS author_name, b.price_cents, \
                    b.description, b.image, char_length(b.content) AS content_chars, b.created_at \
             FROM books b JOIN authors a ON a.id = b.author_id \
             ORDER BY b.title",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_authors(&self) -> Result<Vec<Author>> {
        let rows: Vec<AuthorRow> = sqlx::query_as("SELECT id, name FROM authors ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Cart
    // =========================================================================

    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartLine>> {
        let rows: Vec<CartLineRow> = sqlx::query_as(
            "SELECT b.id AS book_id, b.title, a.name AS author_name, b.price_cents, c.added_at \
             FROM cart_items c \
             JOIN books b ON b.id = c.book_id \
             JOIN authors a ON a.id = b.author_id \
             WHERE c.user_id = $1 \
             ORDER BY c.added_at",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_to_cart(&self, user_id: &UserId, book_id: &BookId) -> Result<CartItem> {
        let row: CartItemRow = sqlx::query_as(
            "INSERT INTO cart_items (id, user_id, book_id) VALUES ($1, $2, $3) \
             RETURNING id, user_id, book_id, added_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id.as_uuid())
        .bind(book_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            write_error(e, || {
                StoreError::Conflict(format!("book {book_id} already in cart"))
            })
        })?;

        Ok(row.into())
    }

    async fn remove_from_cart(&self, user_id: &UserId, book_id: &BookId) -> Result<()> {
        let removed = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND book_id = $2")
            .bind(user_id.as_uuid())
            .bind(book_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if removed == 0 {
            return Err(StoreError::not_found("cart item", book_id));
        }
        Ok(())
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(removed)
    }

    // =========================================================================
    // Library
    // =========================================================================

    async fn list_library(&self, user_id: &UserId) -> Result<Vec<LibraryBook>> {
        let rows: Vec<LibraryBookRow> = sqlx::query_as(
            "SELECT b.id AS book_id, b.title, a.name AS author_name, b.description, b.image, \
                    b.price_cents, l.last_page_read, char_length(b.content) AS content_chars, \
                    l.added_at \
             FROM library_entries l \
             JOIN books b ON b.id = l.book_id \
             JOIN authors a ON a.id = b.author_id \
             WHERE l.user_id = $1 \
             ORDER BY l.added_at DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_library_entry(
        &self,
        user_id: &UserId,
        book_id: &BookId,
    ) -> Result<Option<LibraryEntry>> {
        let row: Option<LibraryEntryRow> = sqlx::query_as(
            "SELECT id, user_id, book_id, last_page_read, added_at FROM library_entries \
             WHERE user_id = $1 AND book_id = $2",
        )
        .bind(user_id.as_uuid())
        .bind(book_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn add_to_library(&self, user_id: &UserId, book_id: &BookId) -> Result<LibraryEntry> {
        let row: LibraryEntryRow = sqlx::query_as(
            "INSERT INTO library_entries (id, user_id, book_id, last_page_read) \
             VALUES ($1, $2, $3, 1) \
             RETURNING id, user_id, book_id, last_page_read, added_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id.as_uuid())
        .bind(book_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            write_error(e, || {
                StoreError::Conflict(format!("book {book_id} already owned"))
            })
        })?;

        Ok(row.into())
    }

    async fn update_progress(
        &self,
        user_id: &UserId,
        book_id: &BookId,
        last_page_read: i32,
    ) -> Result<LibraryEntry> {
        let row: Option<LibraryEntryRow> = sqlx::query_as(
            "UPDATE library_entries SET last_page_read = $3 \
             WHERE user_id = $1 AND book_id = $2 \
             RETURNING id, user_id, book_id, last_page_read, added_at",
        )
        .bind(user_id.as_uuid())
        .bind(book_id.as_uuid())
        .bind(last_page_read)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Into::into)
            .ok_or_else(|| StoreError::not_found("library entry", book_id))
    }

    // =========================================================================
    // Payments
    // =========================================================================

    async fn list_payments(&self, user_id: &UserId) -> Result<Vec<PaymentRecord>> {
        let rows: Vec<PaymentRow> = sqlx::query_as(
            "SELECT id, payment_id, user_id, amount_cents, created_at FROM payments \
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn has_payment(&self, payment_id: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM payments WHERE payment_id = $1)")
                .bind(payment_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn complete_purchase(&self, purchase: &Purchase) -> Result<PurchaseOutcome> {
        let mut tx = self.pool.begin().await?;

        // Claim the idempotency key first. A concurrent delivery of the same
        // event blocks on the unique index until this transaction finishes,
        // then inserts nothing.
        let claimed = sqlx::query(
            "INSERT INTO payments (id, payment_id, user_id, amount_cents) \
             VALUES ($1, $2, $3, $4) ON CONFLICT (payment_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(&purchase.payment_id)
        .bind(purchase.user_id.as_uuid())
        .bind(purchase.amount_cents)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, || StoreError::Database("unexpected conflict".into())))?
        .rows_affected();

        if claimed == 0 {
            tx.rollback().await?;
            return Ok(PurchaseOutcome::Duplicate);
        }

        let purchased: Vec<Uuid> = purchase.book_ids.iter().map(|id| *id.as_uuid()).collect();

        let owned: Vec<Uuid> = sqlx::query_scalar(
            "SELECT book_id FROM library_entries WHERE user_id = $1 AND book_id = ANY($2)",
        )
        .bind(purchase.user_id.as_uuid())
        .bind(&purchased)
        .fetch_all(&mut *tx)
        .await?;
        let owned: HashSet<BookId> = owned.into_iter().map(BookId::from).collect();

        let mut added = Vec::new();
        for book_id in books_to_credit(&owned, &purchase.book_ids) {
            let inserted = sqlx::query(
                "INSERT INTO library_entries (id, user_id, book_id, last_page_read) \
                 VALUES ($1, $2, $3, 1) ON CONFLICT (user_id, book_id) DO NOTHING",
            )
            .bind(Uuid::new_v4())
            .bind(purchase.user_id.as_uuid())
            .bind(book_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| write_error(e, || StoreError::Database("unexpected conflict".into())))?
            .rows_affected();

            if inserted > 0 {
                added.push(book_id);
            }
        }

        let cart_removed =
            sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND book_id = ANY($2)")
                .bind(purchase.user_id.as_uuid())
                .bind(&purchased)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        tx.commit().await?;

        tracing::debug!(
            payment_id = %purchase.payment_id,
            user_id = %purchase.user_id,
            books_added = added.len(),
            cart_removed,
            "Purchase reconciled"
        );

        Ok(PurchaseOutcome::Applied {
            added,
            cart_removed,
        })
    }
}
