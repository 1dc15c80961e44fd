//! Book change events and the emitter seam used by producers

use crate::books::Book;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of change a `BookEvent` describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Created, EventKind::Updated, EventKind::Deleted];

    /// Name of the event on the wire (`book-created`, ...)
    pub fn wire_name(self) -> &'static str {
        match self {
            EventKind::Created => "book-created",
            EventKind::Updated => "book-updated",
            EventKind::Deleted => "book-deleted",
        }
    }

    /// Short badge shown next to a notification
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Created => "CREATE",
            EventKind::Updated => "UPDATE",
            EventKind::Deleted => "DELETE",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.wire_name() == s)
            .ok_or_else(|| format!("Unknown event name: {}", s))
    }
}

/// A book change, as published on the bus and sent to subscribers.
///
/// Serializes to the wire shape directly:
/// `{"event": "book-created", "data": {"message": ..., "book": {...}}}`
/// and `{"event": "book-deleted", "data": {"message": ..., "bookId": "42"}}`.
///
/// Must be Clone: every subscriber receives its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum BookEvent {
    #[serde(rename = "book-created")]
    Created { message: String, book: Book },
    #[serde(rename = "book-updated")]
    Updated { message: String, book: Book },
    #[serde(rename = "book-deleted")]
    Deleted {
        message: String,
        #[serde(rename = "bookId")]
        book_id: String,
    },
}

impl BookEvent {
    /// Event for a freshly created book
    pub fn created(book: Book) -> Self {
        Self::Created {
            message: format!("Book \"{}\" has been created", book.title),
            book,
        }
    }

    /// Event carrying the post-update state of a book
    pub fn updated(book: Book) -> Self {
        Self::Updated {
            message: format!("Book \"{}\" has been updated", book.title),
            book,
        }
    }

    /// Event for a deleted book; only the id survives
    pub fn deleted(book_id: impl Into<String>) -> Self {
        let book_id = book_id.into();
        Self::Deleted {
            message: format!("Book with ID \"{}\" has been deleted", book_id),
            book_id,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::Created { .. } => EventKind::Created,
            Self::Updated { .. } => EventKind::Updated,
            Self::Deleted { .. } => EventKind::Deleted,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Created { message, .. }
            | Self::Updated { message, .. }
            | Self::Deleted { message, .. } => message,
        }
    }

    /// The full record, for created/updated events
    pub fn book(&self) -> Option<&Book> {
        match self {
            Self::Created { book, .. } | Self::Updated { book, .. } => Some(book),
            Self::Deleted { .. } => None,
        }
    }

    /// The id of the affected book, for every kind
    pub fn book_id(&self) -> &str {
        match self {
            Self::Created { book, .. } | Self::Updated { book, .. } => &book.id,
            Self::Deleted { book_id, .. } => book_id,
        }
    }
}

/// Sink for book events.
///
/// Emitting is fire-and-forget: it never blocks, never fails, and returns
/// nothing the caller could branch on.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: BookEvent);

    fn emit_created(&self, book: &Book) {
        self.emit(BookEvent::created(book.clone()));
    }

    fn emit_updated(&self, book: &Book) {
        self.emit(BookEvent::updated(book.clone()));
    }

    fn emit_deleted(&self, book_id: &str) {
        self.emit(BookEvent::deleted(book_id));
    }
}
