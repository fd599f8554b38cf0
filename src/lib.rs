//! # Bookshelf Backend Library
//!
//! CRUD API for book records with a rotating request/response access log.
//!
//! ## Architecture
//!
//! - **Axum**: HTTP server, routing and middleware
//! - **SQLx**: asynchronous SQLite access
//! - **Tokio**: async runtime
//! - **Serde**: JSON request and response bodies
//!
//! Requests flow through [`routes`] into the [`service`] layer, which enforces
//! title uniqueness and soft deletion on top of the [`repository`]. The
//! [`middleware::access_log`] layer wraps every request and writes one line per
//! transaction through the [`logger`].
//!
//! ## Core Components
//!
//! - [`config`]: layered configuration (embedded defaults, file, environment)
//! - [`db`]: pool setup and schema initialization
//! - [`error`]: HTTP error responses
//! - [`logger`]: time-bucketed log files
//! - [`metrics`]: request and book counters
//! - [`middleware`]: access logging and client address resolution
//! - [`repository`]: SQL gateway for books
//! - [`routes`]: HTTP handlers and the router
//! - [`service`]: business rules for books
//! - [`state`]: shared application state
//! - [`types`]: the book model and request payloads

pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;
