//! Catalog types: books and authors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::pagination::total_pages;
use crate::{AuthorId, BookId};

/// An author. Names are unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// The author ID.
    pub id: AuthorId,
    /// Display name.
    pub name: String,
}

/// A book in the public catalog, including its full text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// The book ID.
    pub id: BookId,

    /// Title, unique across the catalog.
    pub title: String,

    /// Author reference.
    pub author_id: AuthorId,

    /// Author display name (joined for convenience).
    pub author_name: String,

    /// Price in cents. Zero means free.
    pub price_cents: i64,

    /// Full plain-text content, paginated by the reader.
    pub content: String,

    /// Short blurb shown in the catalog.
    pub description: String,

    /// Optional cover image URL.
    pub image: Option<String>,

    /// When the book was added to the catalog.
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Whether the book can be claimed without payment.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.price_cents == 0
    }

    /// Number of reader pages in the content.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        total_pages(&self.content)
    }
}

/// Catalog listing view of a book, without content.
#[derive(Debug, Clone, Serialize)]
pub struct BookSummary {
    /// The book ID.
    pub id: BookId,
    /// Title.
    pub title: String,
    /// Author ID.
    pub author_id: AuthorId,
    /// Author display name.
    pub author: String,
    /// Price in cents.
    pub price_cents: i64,
    /// Whether the book is free.
    pub is_free: bool,
    /// Short blurb.
    pub description: String,
    /// Cover image URL.
    pub image: Option<String>,
    /// Number of reader pages.
    pub total_pages: usize,
    /// When the book was added.
    pub created_at: DateTime<Utc>,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author_id: book.author_id,
            author: book.author_name.clone(),
            price_cents: book.price_cents,
            is_free: book.is_free(),
            description: book.description.clone(),
            image: book.image.clone(),
            total_pages: book.total_pages(),
            created_at: book.created_at,
        }
    }
}

/// Input for adding a book to the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    /// Title.
    pub title: String,
    /// Author name; the author is created if unknown.
    pub author: String,
    /// Full text.
    pub content: String,
    /// Short blurb.
    #[serde(default)]
    pub description: String,
    /// Price in cents (defaults to free).
    #[serde(default)]
    pub price_cents: i64,
    /// Cover image URL.
    #[serde(default)]
    pub image: Option<String>,
}

impl NewBook {
    /// Trim text fields and check the catalog rules.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for empty title, author or content, and
    /// `CoreError::InvalidAmount` for a negative price.
    pub fn validated(mut self) -> Result<Self> {
        self.title = self.title.trim().to_string();
        self.author = self.author.trim().to_string();
        self.description = self.description.trim().to_string();
        self.image = self
            .image
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        for (field, value) in [
            ("title", &self.title),
            ("author", &self.author),
            ("content", &self.content),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Validation {
                    field,
                    reason: format!("{field} is required"),
                });
            }
        }

        if self.price_cents < 0 {
            return Err(CoreError::InvalidAmount(format!(
                "price_cents must not be negative, got {}",
                self.price_cents
            )));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book(price_cents: i64) -> NewBook {
        NewBook {
            title: "  Les Misérables ".into(),
            author: " Victor Hugo".into(),
            content: "Un homme".into(),
            description: String::new(),
            price_cents,
            image: Some("   ".into()),
        }
    }

    #[test]
    fn validated_trims_fields() {
        let book = new_book(499).validated().unwrap();
        assert_eq!(book.title, "Les Misérables");
        assert_eq!(book.author, "Victor Hugo");
        assert_eq!(book.image, None);
    }

    #[test]
    fn validated_rejects_negative_price() {
        assert!(matches!(
            new_book(-1).validated(),
            Err(CoreError::InvalidAmount(_))
        ));
    }

    #[test]
    fn validated_rejects_blank_content() {
        let mut book = new_book(0);
        book.content = "\n  ".into();
        assert!(matches!(
            book.validated(),
            Err(CoreError::Validation { field: "content", .. })
        ));
    }

    #[test]
    fn summary_reports_free_flag_and_pages() {
        let book = Book {
            id: BookId::generate(),
            title: "Free".into(),
            author_id: AuthorId::generate(),
            author_name: "Anon".into(),
            price_cents: 0,
            content: "x".repeat(2001),
            description: String::new(),
            image: None,
            created_at: Utc::now(),
        };
        let summary = BookSummary::from(&book);
        assert!(summary.is_free);
        assert_eq!(summary.total_pages, 3);
    }
}
