use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::logger::Logger;
use crate::metrics::Metrics;
use crate::repository::SqliteBookRepository;
use crate::service::{BookService, DefaultBookService};

/// The shared application state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    /// Kept for the readiness check; book queries go through `books`.
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub books: Arc<dyn BookService>,
    /// Rotating access/application log. Closed by the entry point on shutdown.
    pub logger: Logger,
    pub metrics: Metrics,
}

impl AppState {
    /// Wires the SQLite repository and the default book service around `db`.
    pub fn new(db: SqlitePool, config: AppConfig, logger: Logger) -> Self {
        let repository = Arc::new(SqliteBookRepository::new(db.clone()));
        let books = Arc::new(DefaultBookService::new(repository, logger.clone()));
        Self::with_service(db, config, logger, books)
    }

    pub fn with_service(
        db: SqlitePool,
        config: AppConfig,
        logger: Logger,
        books: Arc<dyn BookService>,
    ) -> Self {
        Self { db, config: Arc::new(config), books, logger, metrics: Metrics::new() }
    }
}
