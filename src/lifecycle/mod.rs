//! Assembly and observability of the bookshelf application.

pub mod bookshelf;
pub mod tracing;

pub use bookshelf::{Bookshelf, BookshelfSettings};
