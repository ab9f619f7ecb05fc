//! Error types for the book repository.

use thiserror::Error;

/// Errors that can occur during book operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BookError {
    /// The requested book was not found.
    #[error("Book not found: {0}")]
    NotFound(u32),

    /// One or more required fields were blank.
    #[error("Invalid book: missing {}", .0.join(", "))]
    Invalid(Vec<&'static str>),

    /// The request did not carry a usable book id.
    #[error("Missing or invalid book id")]
    InvalidId,
}
