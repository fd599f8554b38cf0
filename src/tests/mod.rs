//! Unit and integration tests for the Bookshelf backend.
//!
//! ## Test Modules
//!
//! - **config_tests**: configuration loading, overrides and validation
//! - **db_tests**: schema initialization
//! - **error_tests**: error rendering and conversions
//! - **logger_tests**: bucket computation, rotation and sanitizing
//! - **service_tests**: book rules against SQLite and against failing doubles
//! - **api_tests**: the HTTP surface through the full router
//! - **access_log_tests**: what the middleware writes for each request
//! - **health_api_tests**: health, readiness, metrics and version endpoints
//!
//! Run with `cargo test`, or a single module with e.g. `cargo test logger_tests`.

pub mod db_tests;
pub mod error_tests;

use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Bytes;
use http_body::Frame;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::{AppConfig, DatabaseConfig};
use crate::logger::Logger;
use crate::state::AppState;

/// Single-connection in-memory database with the schema applied.
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    crate::db::init_db(&pool).await.unwrap();
    pool
}

/// File-backed database under `dir` with a real multi-connection pool, for
/// tests where writers must actually race.
pub(crate) async fn file_pool(dir: &Path, max_connections: u32) -> SqlitePool {
    let cfg = DatabaseConfig {
        url: format!("sqlite://{}", dir.join("books.db").display()),
        max_connections,
    };
    let pool = crate::db::connect(&cfg).await.unwrap();
    crate::db::init_db(&pool).await.unwrap();
    pool
}

/// Body whose first poll fails, as a dropped client connection or a broken
/// upstream stream would.
pub(crate) struct BrokenBody;

impl http_body::Body for BrokenBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
        Poll::Ready(Some(Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset"))))
    }
}

/// Default config with logs redirected into `log_dir`.
pub(crate) fn test_config(log_dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.logging.dir = log_dir.to_path_buf();
    config
}

pub(crate) async fn test_state(log_dir: &Path) -> AppState {
    let config = test_config(log_dir);
    let logger = Logger::from_config(&config.logging);
    AppState::new(memory_pool().await, config, logger)
}

/// Contents of every log file below `dir`, in path order.
pub(crate) fn read_logs(dir: &Path) -> String {
    let mut files = Vec::new();
    collect_files(dir, &mut files);
    files.sort();
    files.iter().map(|p| std::fs::read_to_string(p).unwrap()).collect()
}

pub(crate) fn collect_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else {
            out.push(path);
        }
    }
}
