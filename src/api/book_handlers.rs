//! Book CRUD handlers
//!
//! All routes here sit behind `require_auth`. Mutations go through
//! `BookManager`, which publishes on success; the HTTP result never depends on
//! whether anyone was listening.

use super::handlers::{AppError, CatalogState};
use crate::auth::AuthUser;
use crate::books::{Book, BookStats, CreateBookRequest, UpdateBookRequest};
use crate::events::BookEvent;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

/// Plain `{"message": ...}` response
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// List all books
pub async fn list_books(
    State(state): State<CatalogState>,
    _user: AuthUser,
) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.books.list_books().await?))
}

/// Catalog summary for the reports view
pub async fn book_stats(
    State(state): State<CatalogState>,
    _user: AuthUser,
) -> Result<Json<BookStats>, AppError> {
    Ok(Json(state.books.stats().await?))
}

/// Get one book
pub async fn get_book(
    State(state): State<CatalogState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(state.books.get_book(&id).await?))
}

/// Create a book → 201, announces `book-created`
pub async fn create_book(
    State(state): State<CatalogState>,
    user: AuthUser,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let Json(req) = payload?;
    let book = state.books.create_book(req).await?;
    tracing::debug!(user = %user.username, book_id = %book.id, "create_book");
    Ok((StatusCode::CREATED, Json(book)))
}

/// Update a book → 200, announces `book-updated`
pub async fn update_book(
    State(state): State<CatalogState>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let Json(req) = payload?;
    let book = state.books.update_book(&id, req).await?;
    tracing::debug!(user = %user.username, book_id = %book.id, "update_book");
    Ok(Json(book))
}

/// Delete a book → 200, announces `book-deleted`
pub async fn delete_book(
    State(state): State<CatalogState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.books.delete_book(&id).await?;
    tracing::debug!(user = %user.username, book_id = %id, "delete_book");
    Ok(Json(MessageResponse {
        message: "Book deleted successfully".to_string(),
    }))
}

/// Remove every book (test support). Not announced.
pub async fn reset_books(
    State(state): State<CatalogState>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    state.books.clear_books().await?;
    tracing::info!(user = %user.username, "Catalog reset");
    Ok(Json(MessageResponse {
        message: "All books cleared".to_string(),
    }))
}

/// Response of `POST /api/events`
#[derive(Serialize)]
pub struct EmitResponse {
    pub success: bool,
    pub event: String,
    pub delivered: usize,
}

/// Publish a caller-supplied wire event to every subscriber
pub async fn emit_event(
    State(state): State<CatalogState>,
    user: AuthUser,
    payload: Result<Json<BookEvent>, JsonRejection>,
) -> Result<Json<EmitResponse>, AppError> {
    let Json(event) = payload?;
    let kind = event.kind();
    let report = state.event_bus.publish(event);
    for failure in &report.failures {
        tracing::warn!(event = %kind, "Delivery failed: {}", failure);
    }
    tracing::info!(
        user = %user.username,
        event = %kind,
        delivered = report.delivered,
        "Relayed external event"
    );

    Ok(Json(EmitResponse {
        success: true,
        event: kind.wire_name().to_string(),
        delivered: report.delivered,
    }))
}
