use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_book, create_loan, delete_book, get_book, get_loan, list_books, list_loans,
    return_loan, update_book,
};

/// Creates the API router with the catalog and loan endpoints
///
/// Catalog:
/// - POST /api/books, GET /api/books
/// - GET/PUT/DELETE /api/books/:id
///
/// Loans:
/// - POST /api/loans, GET /api/loans
/// - GET /api/loans/:id
/// - POST /api/loans/:id/return
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/api/books", post(create_book).get(list_books))
        .route(
            "/api/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/api/loans", post(create_loan).get(list_loans))
        .route("/api/loans/:id", get(get_loan))
        .route("/api/loans/:id/return", post(return_loan))
        // Add tracing middleware
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
