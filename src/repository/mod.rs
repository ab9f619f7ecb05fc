//! # Book Repository
//!
//! An in-memory store shared by every slice through the application
//! container. It is started by the `books` provider, so it exists only once
//! something resolves `books.repository` (or the application boots).

pub mod error;

pub use error::BookError;

use crate::model::{Book, BookCreate};
use slice_framework::Provider;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Container key of the shared repository.
pub const REPOSITORY_KEY: &str = "books.repository";

/// Cloning shares the underlying store.
#[derive(Debug, Clone, Default)]
pub struct BookRepository {
    books: Arc<RwLock<BTreeMap<u32, Book>>>,
    next_id: Arc<AtomicU32>,
}

impl BookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository holding `books`, numbered from 1.
    pub fn seeded<I>(books: I) -> Self
    where
        I: IntoIterator<Item = BookCreate>,
    {
        let mut repository = Self::new();
        let mut store = BTreeMap::new();
        for params in books {
            let book = repository.build(params);
            store.insert(book.id, book);
        }
        repository.books = Arc::new(RwLock::new(store));
        repository
    }

    fn build(&self, params: BookCreate) -> Book {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Book {
            id,
            title: params.title,
            author: params.author,
        }
    }

    pub async fn list(&self, limit: usize) -> Vec<Book> {
        self.books.read().await.values().take(limit).cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.books.read().await.len()
    }

    pub async fn get(&self, id: u32) -> Result<Book, BookError> {
        debug!(book_id = id, "Get");
        self.books
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(BookError::NotFound(id))
    }

    pub async fn create(&self, params: BookCreate) -> Result<Book, BookError> {
        let errors = params.validate();
        if !errors.is_empty() {
            return Err(BookError::Invalid(errors));
        }
        let book = self.build(params);
        let mut books = self.books.write().await;
        books.insert(book.id, book.clone());
        info!(book_id = book.id, size = books.len(), "Created");
        Ok(book)
    }

    pub async fn delete(&self, id: u32) -> Result<Book, BookError> {
        let mut books = self.books.write().await;
        let book = books.remove(&id).ok_or(BookError::NotFound(id))?;
        info!(book_id = id, size = books.len(), "Deleted");
        Ok(book)
    }
}

/// The `books` provider: registers a repository seeded with `seed` under
/// [`REPOSITORY_KEY`] when started.
pub fn provider(seed: Vec<BookCreate>) -> Provider {
    Provider::new("books")
        .start(move |container| {
            let repository = BookRepository::seeded(seed.clone());
            info!(container = container.name(), "Book repository started");
            container.register(REPOSITORY_KEY, repository)
        })
        .stop(|container| {
            info!(container = container.name(), "Book repository stopped");
            Ok(())
        })
}
