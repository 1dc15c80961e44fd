//! Test helper factories and mock state builders
//!
//! Provides convenience functions for creating test objects with sensible defaults,
//! and helpers for building a `CatalogState` backed by the in-memory store.
#![allow(dead_code)]

use crate::api::{CatalogState, ServerState};
use crate::books::{
    Book, BookManager, CreateBookRequest, InMemoryBookStore, YearInput,
};
use crate::events::{BookEvent, EventBus, EventEmitter};
use crate::{AuthConfig, UserAccountConfig};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// JWT secret shared by every test that signs or checks tokens
pub const TEST_SECRET: &str = "test-secret-key-minimum-32-chars!!";

// ============================================================================
// Mock state builders
// ============================================================================

/// Create a test AuthConfig with the `admin`/`admin` and `demo`/`demo` accounts.
///
/// Tests that use `create_router()` should pass `Some(test_auth_config())`
/// to `test_state` to avoid deny-by-default 403 rejections.
pub fn test_auth_config() -> AuthConfig {
    let user = |name: &str| UserAccountConfig {
        username: name.to_string(),
        // Lowest bcrypt cost keeps the suite fast
        password_hash: bcrypt::hash(name, 4).expect("bcrypt hash should succeed"),
    };
    AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        jwt_expiry_secs: 3600,
        secure_cookies: false,
        users: vec![user("admin"), user("demo")],
    }
}

/// Build server state over the seeded in-memory store, wired to a fresh bus.
pub fn test_state(auth_config: Option<AuthConfig>) -> CatalogState {
    let event_bus = Arc::new(EventBus::default());
    let books = Arc::new(BookManager::with_event_emitter(
        Arc::new(InMemoryBookStore::seeded()),
        event_bus.clone(),
    ));
    Arc::new(ServerState {
        books,
        event_bus,
        auth_config,
        ping_interval: Duration::from_secs(30),
    })
}

/// Generate a valid Bearer header value for test requests.
///
/// Returns the full header value: `"Bearer eyJ..."`.
/// Uses the same secret as `test_auth_config()`.
pub fn bearer_token(username: &str) -> String {
    let token = crate::auth::jwt::encode_jwt(username, TEST_SECRET, 3600)
        .expect("test token encoding should succeed");
    format!("Bearer {}", token)
}

// ============================================================================
// Test data factories
// ============================================================================

/// Create a stored-looking book with sensible defaults
pub fn test_book(id: &str, title: &str) -> Book {
    let now = Utc::now();
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: "Frank Herbert".to_string(),
        isbn: "978-0-441-17271-9".to_string(),
        published_year: 1965,
        genre: "Science Fiction".to_string(),
        created_at: now,
        updated_at: now,
    }
}

/// A valid create payload with the given title
pub fn create_request(title: &str) -> CreateBookRequest {
    CreateBookRequest {
        title: Some(title.to_string()),
        author: Some("Frank Herbert".to_string()),
        isbn: Some("978-0-441-17271-9".to_string()),
        published_year: Some(YearInput::Number(1965)),
        genre: Some("Science Fiction".to_string()),
    }
}

// ============================================================================
// Recording emitter
// ============================================================================

/// An `EventEmitter` that keeps every event it is handed, in order.
#[derive(Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<BookEvent>>,
}

impl RecordingEmitter {
    pub fn events(&self) -> Vec<BookEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit(&self, event: BookEvent) {
        self.events.lock().unwrap().push(event);
    }
}
