//! Book Manager - CRUD operations that announce their changes
//!
//! Every successful create/update/delete emits a `BookEvent`. Validation and
//! not-found failures return before the store or the emitter is touched.

use super::models::{Book, BookStats, CreateBookRequest, UpdateBookRequest};
use super::store::BookStore;
use crate::events::EventEmitter;
use std::sync::Arc;

/// Producer-side failures, reported synchronously to the caller of a mutation
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("{0}")]
    Validation(String),
    #[error("Book not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type BookResult<T> = std::result::Result<T, BookError>;

/// Manager for book operations
pub struct BookManager {
    store: Arc<dyn BookStore>,
    event_emitter: Option<Arc<dyn EventEmitter>>,
}

impl BookManager {
    /// Create a manager that does not announce changes
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self {
            store,
            event_emitter: None,
        }
    }

    /// Create a manager that emits a `BookEvent` after every successful mutation
    pub fn with_event_emitter(store: Arc<dyn BookStore>, emitter: Arc<dyn EventEmitter>) -> Self {
        Self {
            store,
            event_emitter: Some(emitter),
        }
    }

    fn emitter(&self) -> Option<&dyn EventEmitter> {
        self.event_emitter.as_deref()
    }

    pub async fn list_books(&self) -> BookResult<Vec<Book>> {
        Ok(self.store.list().await?)
    }

    /// Totals by genre and by year over the current catalog
    pub async fn stats(&self) -> BookResult<BookStats> {
        Ok(BookStats::from_books(&self.store.list().await?))
    }

    pub async fn get_book(&self, id: &str) -> BookResult<Book> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| BookError::NotFound(id.to_string()))
    }

    /// Create a book
    pub async fn create_book(&self, req: CreateBookRequest) -> BookResult<Book> {
        let new_book = req.validate().map_err(BookError::Validation)?;
        let book = self.store.create(new_book).await?;

        tracing::info!(book_id = %book.id, title = %book.title, "Book created");
        if let Some(emitter) = self.emitter() {
            emitter.emit_created(&book);
        }

        Ok(book)
    }

    /// Update a book; the event carries the post-update record
    pub async fn update_book(&self, id: &str, req: UpdateBookRequest) -> BookResult<Book> {
        let patch = req.validate().map_err(BookError::Validation)?;
        let book = self
            .store
            .update(id, patch)
            .await?
            .ok_or_else(|| BookError::NotFound(id.to_string()))?;

        tracing::info!(book_id = %book.id, "Book updated");
        if let Some(emitter) = self.emitter() {
            emitter.emit_updated(&book);
        }

        Ok(book)
    }

    /// Delete a book; the event carries only the id
    pub async fn delete_book(&self, id: &str) -> BookResult<()> {
        if !self.store.delete(id).await? {
            return Err(BookError::NotFound(id.to_string()));
        }

        tracing::info!(book_id = %id, "Book deleted");
        if let Some(emitter) = self.emitter() {
            emitter.emit_deleted(id);
        }

        Ok(())
    }

    /// Remove every book. Not announced to subscribers.
    pub async fn clear_books(&self) -> BookResult<()> {
        self.store.clear().await?;
        tracing::info!("All books cleared");
        Ok(())
    }
}
