use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Request and book counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub requests: Arc<AtomicU64>,
    pub client_errors: Arc<AtomicU64>,
    pub server_errors: Arc<AtomicU64>,
    pub books_created: Arc<AtomicU64>,
    pub books_updated: Arc<AtomicU64>,
    pub books_deleted: Arc<AtomicU64>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(AtomicU64::new(0)),
            client_errors: Arc::new(AtomicU64::new(0)),
            server_errors: Arc::new(AtomicU64::new(0)),
            books_created: Arc::new(AtomicU64::new(0)),
            books_updated: Arc::new(AtomicU64::new(0)),
            books_deleted: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn record_response(&self, status: u16) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if status >= 500 {
            self.server_errors.fetch_add(1, Ordering::Relaxed);
        } else if status >= 400 {
            self.client_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn inc_books_created(&self) {
        self.books_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_books_updated(&self) {
        self.books_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_books_deleted(&self) {
        self.books_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            books_created: self.books_created.load(Ordering::Relaxed),
            books_updated: self.books_updated.load(Ordering::Relaxed),
            books_deleted: self.books_deleted.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub books_created: u64,
    pub books_updated: u64,
    pub books_deleted: u64,
    pub uptime_seconds: u64,
}
