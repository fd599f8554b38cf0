//! HTTP route handlers for the Bookshelf API.
//!
//! - `books`: CRUD endpoints for book records
//! - `health`: health, readiness, metrics and version endpoints

pub mod books;
pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::{routing::get, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::middleware::access_log::access_log_middleware;
use crate::state::AppState;

/// Builds the full application router, access logging included.
pub fn router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_bytes;

    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        .route("/version", get(health::version))
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/{id}",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(max_body))
        // Inside the access log so a panicking handler is still logged as a 500.
        .layer(CatchPanicLayer::new())
        .layer(from_fn_with_state(state, access_log_middleware))
        .layer(TraceLayer::new_for_http())
}
