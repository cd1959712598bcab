//! In-memory storage implementation.
//!
//! All tables sit behind one `RwLock`, so every compound operation is atomic
//! and the same uniqueness rules as the PostgreSQL schema are checked by hand.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use jecris_core::{
    books_to_credit, Author, AuthorId, Book, BookId, BookSummary, CartItem, CartLine, EntryId,
    LibraryBook, LibraryEntry, NewBook, NewUser, PaymentRecord, PaymentRecordId, Purchase,
    PurchaseOutcome, User, UserId,
};

use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    authors: Vec<Author>,
    books: Vec<Book>,
    cart: Vec<CartItem>,
    library: Vec<LibraryEntry>,
    payments: Vec<PaymentRecord>,
}

impl Tables {
    fn book(&self, book_id: &BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.id == *book_id)
    }

    fn require_user(&self, user_id: &UserId) -> Result<()> {
        if self.users.iter().any(|u| u.id == *user_id) {
            Ok(())
        } else {
            Err(StoreError::not_found("user", user_id))
        }
    }

    fn require_book(&self, book_id: &BookId) -> Result<&Book> {
        self.book(book_id)
            .ok_or_else(|| StoreError::not_found("book", book_id))
    }

    fn owns(&self, user_id: &UserId, book_id: &BookId) -> bool {
        self.library
            .iter()
            .any(|e| e.user_id == *user_id && e.book_id == *book_id)
    }
}

/// Storage backed by process memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email already registered: {}",
                user.email
            )));
        }

        let user = User {
            id: UserId::generate(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == *user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn create_book(&self, book: &NewBook) -> Result<Book> {
        let mut tables = self.tables.write().await;
        if tables.books.iter().any(|b| b.title == book.title) {
            return Err(StoreError::Conflict(format!(
                "title already exists: {}",
                book.title
            )));
        }

        let author = if let Some(a) = tables.authors.iter().find(|a| a.name == book.author) {
            a.clone()
        } else {
            let author = Author {
                id: AuthorId::generate(),
                name: book.author.clone(),
            };
            tables.authors.push(author.clone());
            author
        };

        let book = Book {
            id: BookId::generate(),
            title: book.title.clone(),
            author_id: author.id,
            author_name: author.name,
            price_cents: book.price_cents,
            content: book.content.clone(),
            description: book.description.clone(),
            image: book.image.clone(),
            created_at: Utc::now(),
        };
        tables.books.push(book.clone());
        Ok(book)
    }

    async fn get_book(&self, book_id: &BookId) -> Result<Option<Book>> {
        Ok(self.tables.read().await.book(book_id).cloned())
    }

    async fn list_books(&self) -> Result<Vec<BookSummary>> {
        let tables = self.tables.read().await;
        let mut books: Vec<BookSummary> = tables.books.iter().map(BookSummary::from).collect();
        books.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(books)
    }

    async fn list_authors(&self) -> Result<Vec<Author>> {
        let mut authors = self.tables.read().await.authors.clone();
        authors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(authors)
    }

    async fn list_cart(&self, user_id: &UserId) -> Result<Vec<CartLine>> {
        let tables = self.tables.read().await;
        Ok(tables
            .cart
            .iter()
            .filter(|item| item.user_id == *user_id)
            .filter_map(|item| {
                tables.book(&item.book_id).map(|book| CartLine {
                    book_id: book.id,
                    title: book.title.clone(),
                    author: book.author_name.clone(),
                    price_cents: book.price_cents,
                    added_at: item.added_at,
                })
            })
            .collect())
    }

    async fn add_to_cart(&self, user_id: &UserId, book_id: &BookId) -> Result<CartItem> {
        let mut tables = self.tables.write().await;
        tables.require_user(user_id)?;
        tables.require_book(book_id)?;

        if tables
            .cart
            .iter()
            .any(|i| i.user_id == *user_id && i.book_id == *book_id)
        {
            return Err(StoreError::Conflict(format!("book {book_id} already in cart")));
        }

        let item = CartItem {
            id: EntryId::generate(),
            user_id: *user_id,
            book_id: *book_id,
            added_at: Utc::now(),
        };
        tables.cart.push(item.clone());
        Ok(item)
    }

    async fn remove_from_cart(&self, user_id: &UserId, book_id: &BookId) -> Result<()> {
        let mut tables = self.tables.write().await;
        let before = tables.cart.len();
        tables
            .cart
            .retain(|i| !(i.user_id == *user_id && i.book_id == *book_id));

        if tables.cart.len() == before {
            return Err(StoreError::not_found("cart item", book_id));
        }
        Ok(())
    }

    async fn clear_cart(&self, user_id: &UserId) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.cart.len();
        tables.cart.retain(|i| i.user_id != *user_id);
        Ok((before - tables.cart.len()) as u64)
    }

    async fn list_library(&self, user_id: &UserId) -> Result<Vec<LibraryBook>> {
        let tables = self.tables.read().await;
        Ok(tables
            .library
            .iter()
            .rev()
            .filter(|e| e.user_id == *user_id)
            .filter_map(|entry| {
                tables.book(&entry.book_id).map(|book| LibraryBook {
                    book_id: book.id,
                    title: book.title.clone(),
                    author: book.author_name.clone(),
                    description: book.description.clone(),
                    image: book.image.clone(),
                    price_cents: book.price_cents,
                    last_page_read: entry.last_page_read,
                    total_pages: book.total_pages(),
                    added_at: entry.added_at,
                })
            })
            .collect())
    }

    async fn get_library_entry(
        &self,
        user_id: &UserId,
        book_id: &BookId,
    ) -> Result<Option<LibraryEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .library
            .iter()
            .find(|e| e.user_id == *user_id && e.book_id == *book_id)
            .cloned())
    }

    async fn add_to_library(&self, user_id: &UserId, book_id: &BookId) -> Result<LibraryEntry> {
        let mut tables = self.tables.write().await;
        tables.require_user(user_id)?;
        tables.require_book(book_id)?;

        if tables.owns(user_id, book_id) {
            return Err(StoreError::Conflict(format!("book {book_id} already owned")));
        }

        let entry = LibraryEntry::new(*user_id, *book_id);
        tables.library.push(entry.clone());
        Ok(entry)
    }

    async fn update_progress(
        &self,
        user_id: &UserId,
        book_id: &BookId,
        last_page_read: i32,
    ) -> Result<LibraryEntry> {
        let mut tables = self.tables.write().await;
        let entry = tables
            .library
            .iter_mut()
            .find(|e| e.user_id == *user_id && e.book_id == *book_id)
            .ok_or_else(|| StoreError::not_found("library entry", book_id))?;

        entry.last_page_read = last_page_read;
        Ok(entry.clone())
    }

    async fn list_payments(&self, user_id: &UserId) -> Result<Vec<PaymentRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payments
            .iter()
            .rev()
            .filter(|p| p.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn has_payment(&self, payment_id: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.payments.iter().any(|p| p.payment_id == payment_id))
    }

    async fn complete_purchase(&self, purchase: &Purchase) -> Result<PurchaseOutcome> {
        let mut tables = self.tables.write().await;

        if tables
            .payments
            .iter()
            .any(|p| p.payment_id == purchase.payment_id)
        {
            return Ok(PurchaseOutcome::Duplicate);
        }

        // Validate everything before the first mutation.
        tables.require_user(&purchase.user_id)?;
        for book_id in &purchase.book_ids {
            tables.require_book(book_id)?;
        }

        let owned: HashSet<BookId> = tables
            .library
            .iter()
            .filter(|e| e.user_id == purchase.user_id)
            .map(|e| e.book_id)
            .collect();
        let added = books_to_credit(&owned, &purchase.book_ids);

        for book_id in &added {
            tables
                .library
                .push(LibraryEntry::new(purchase.user_id, *book_id));
        }

        let before = tables.cart.len();
        tables.cart.retain(|i| {
            !(i.user_id == purchase.user_id && purchase.book_ids.contains(&i.book_id))
        });
        let cart_removed = (before - tables.cart.len()) as u64;

        tables.payments.push(PaymentRecord {
            id: PaymentRecordId::generate(),
            payment_id: purchase.payment_id.clone(),
            user_id: purchase.user_id,
            amount_cents: purchase.amount_cents,
            created_at: Utc::now(),
        });

        Ok(PurchaseOutcome::Applied {
            added,
            cart_removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed() -> (MemoryStore, User, Book, Book) {
        let store = MemoryStore::new();
        let user = store
            .create_user(&NewUser::new("reader@example.com", "hash".into()).unwrap())
            .await
            .unwrap();
        let paid = store.create_book(&new_book("Paid", 999)).await.unwrap();
        let other = store.create_book(&new_book("Other", 499)).await.unwrap();
        (store, user, paid, other)
    }

    fn new_book(title: &str, price_cents: i64) -> NewBook {
        NewBook {
            title: title.into(),
            author: "Jules Verne".into(),
            content: "Il était une fois".into(),
            description: String::new(),
            price_cents,
            image: None,
        }
    }

    fn purchase(user: &User, books: &[&Book], payment_id: &str) -> Purchase {
        Purchase {
            payment_id: payment_id.into(),
            user_id: user.id,
            book_ids: books.iter().map(|b| b.id).collect(),
            amount_cents: books.iter().map(|b| b.price_cents).sum(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (store, user, _, _) = seed().await;
        let again = NewUser::new(&user.email, "other".into()).unwrap();
        assert!(matches!(
            store.create_user(&again).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn books_share_author_by_name() {
        let (store, _, paid, other) = seed().await;
        assert_eq!(paid.author_id, other.author_id);
        assert_eq!(store.list_authors().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cart_rejects_duplicates() {
        let (store, user, paid, _) = seed().await;
        store.add_to_cart(&user.id, &paid.id).await.unwrap();
        assert!(matches!(
            store.add_to_cart(&user.id, &paid.id).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn purchase_is_idempotent() {
        let (store, user, paid, other) = seed().await;
        store.add_to_cart(&user.id, &paid.id).await.unwrap();
        store.add_to_cart(&user.id, &other.id).await.unwrap();

        let p = purchase(&user, &[&paid, &other], "evt_1");
        assert!(!store.has_payment("evt_1").await.unwrap());
        let first = store.complete_purchase(&p).await.unwrap();
        assert!(store.has_payment("evt_1").await.unwrap());
        assert_eq!(first.books_added(), 2);

        for _ in 0..3 {
            assert_eq!(
                store.complete_purchase(&p).await.unwrap(),
                PurchaseOutcome::Duplicate
            );
        }

        assert_eq!(store.list_library(&user.id).await.unwrap().len(), 2);
        assert!(store.list_cart(&user.id).await.unwrap().is_empty());
        assert_eq!(store.list_payments(&user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn purchase_credits_only_unowned_books() {
        let (store, user, paid, other) = seed().await;
        store.add_to_library(&user.id, &paid.id).await.unwrap();

        let outcome = store
            .complete_purchase(&purchase(&user, &[&paid, &other], "evt_2"))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            PurchaseOutcome::Applied {
                added: vec![other.id],
                cart_removed: 0
            }
        );
    }

    #[tokio::test]
    async fn purchase_with_unknown_book_changes_nothing() {
        let (store, user, paid, _) = seed().await;
        store.add_to_cart(&user.id, &paid.id).await.unwrap();

        let mut p = purchase(&user, &[&paid], "evt_3");
        p.book_ids.push(BookId::generate());

        assert!(matches!(
            store.complete_purchase(&p).await,
            Err(StoreError::NotFound { entity: "book", .. })
        ));
        assert!(!store.has_payment("evt_3").await.unwrap());
        assert_eq!(store.list_cart(&user.id).await.unwrap().len(), 1);
        assert!(store.list_library(&user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn progress_requires_ownership() {
        let (store, user, paid, _) = seed().await;
        assert!(store.update_progress(&user.id, &paid.id, 2).await.is_err());

        store.add_to_library(&user.id, &paid.id).await.unwrap();
        let entry = store.update_progress(&user.id, &paid.id, 2).await.unwrap();
        assert_eq!(entry.last_page_read, 2);
    }
}
