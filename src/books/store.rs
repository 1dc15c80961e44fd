//! BookStore trait and the in-memory implementation
//!
//! The store is a plain collaborator: it knows nothing about events or auth.
//! `BookManager` wraps it and is the only thing that publishes.

use super::models::{Book, BookPatch, NewBook};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Abstract interface for book persistence.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new book and return it with its assigned id and timestamps
    async fn create(&self, book: NewBook) -> Result<Book>;

    /// Get a book by id
    async fn get(&self, id: &str) -> Result<Option<Book>>;

    /// Merge a patch into an existing book; `None` if the id is unknown
    async fn update(&self, id: &str, patch: BookPatch) -> Result<Option<Book>>;

    /// Remove a book; `false` if the id is unknown
    async fn delete(&self, id: &str) -> Result<bool>;

    /// List all books in insertion order
    async fn list(&self) -> Result<Vec<Book>>;

    /// Remove every book
    async fn clear(&self) -> Result<()>;
}

/// Process-local store backed by a `Vec`, in insertion order.
#[derive(Default)]
pub struct InMemoryBookStore {
    books: RwLock<Vec<Book>>,
}

impl InMemoryBookStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the two catalog classics (ids "1" and "2")
    pub fn seeded() -> Self {
        Self {
            books: RwLock::new(seed_books()),
        }
    }
}

fn seed_books() -> Vec<Book> {
    let now = Utc::now();
    vec![
        Book {
            id: "1".to_string(),
            title: "The Great Gatsby".to_string(),
            author: "F. Scott Fitzgerald".to_string(),
            isbn: "978-0-7432-7356-5".to_string(),
            published_year: 1925,
            genre: "Fiction".to_string(),
            created_at: now,
            updated_at: now,
        },
        Book {
            id: "2".to_string(),
            title: "To Kill a Mockingbird".to_string(),
            author: "Harper Lee".to_string(),
            isbn: "978-0-06-112008-4".to_string(),
            published_year: 1960,
            genre: "Fiction".to_string(),
            created_at: now,
            updated_at: now,
        },
    ]
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn create(&self, book: NewBook) -> Result<Book> {
        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: book.title,
            author: book.author,
            isbn: book.isbn,
            published_year: book.published_year,
            genre: book.genre,
            created_at: now,
            updated_at: now,
        };
        self.books.write().await.push(book.clone());
        Ok(book)
    }

    async fn get(&self, id: &str) -> Result<Option<Book>> {
        Ok(self.books.read().await.iter().find(|b| b.id == id).cloned())
    }

    async fn update(&self, id: &str, patch: BookPatch) -> Result<Option<Book>> {
        let mut books = self.books.write().await;
        let Some(book) = books.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        patch.apply_to(book);
        book.updated_at = Utc::now();
        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|b| b.id != id);
        Ok(books.len() != before)
    }

    async fn list(&self) -> Result<Vec<Book>> {
        Ok(self.books.read().await.clone())
    }

    async fn clear(&self) -> Result<()> {
        self.books.write().await.clear();
        Ok(())
    }
}
