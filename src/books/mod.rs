//! Book catalog: records, storage and the producers that announce changes

mod manager;
mod models;
mod store;

pub use manager::{BookError, BookManager, BookResult};
pub use models::{
    Book, BookPatch, BookStats, CreateBookRequest, NewBook, UpdateBookRequest, YearInput,
};
pub use store::{BookStore, InMemoryBookStore};
