//! HTTP API: book CRUD, login and the `/ws/events` subscription endpoint

pub mod auth_handlers;
pub mod book_handlers;
pub mod handlers;
pub mod routes;
pub mod ws_handlers;

pub use handlers::{CatalogState, ServerState};
pub use routes::create_router;
pub use ws_handlers::WS_EVENTS_PATH;
