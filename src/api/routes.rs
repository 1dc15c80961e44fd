//! API route definitions

use super::handlers::{self, CatalogState};
use super::{auth_handlers, book_handlers, ws_handlers};
use crate::auth::require_auth;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: CatalogState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // ========================================================================
    // Protected routes (JWT via Bearer header or `token` cookie)
    // ========================================================================
    let protected = Router::new()
        .route(
            "/api/books",
            get(book_handlers::list_books).post(book_handlers::create_book),
        )
        .route("/api/books/reset", post(book_handlers::reset_books))
        .route("/api/books/stats", get(book_handlers::book_stats))
        .route(
            "/api/books/{id}",
            get(book_handlers::get_book)
                .put(book_handlers::update_book)
                .delete(book_handlers::delete_book),
        )
        .route("/api/events", post(book_handlers::emit_event))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    // ========================================================================
    // Public routes
    // ========================================================================
    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/login", post(auth_handlers::login))
        .route("/api/auth/logout", post(auth_handlers::logout))
        .route(ws_handlers::WS_EVENTS_PATH, get(ws_handlers::ws_events));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
