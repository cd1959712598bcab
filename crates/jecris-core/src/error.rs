//! Error types for Jecris domain operations.

use crate::checkout::MetadataError;
use crate::pagination::PageError;

/// Result type for Jecris domain operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by domain validation, independent of storage or transport.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Requested page is outside the book.
    #[error(transparent)]
    Page(#[from] PageError),

    /// Checkout metadata from the payment provider is unusable.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Invalid amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A required field is empty or malformed.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Field name as seen by the client.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },
}
