use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted book. `deleted_at` is set once the book has been soft-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Comparison key for title uniqueness: trimmed and lowercased with full
/// Unicode case folding, so "Éclair" and " éclair" collide.
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Fields for a book that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBookRequest {
    pub title: String,
    pub author: String,
}

impl CreateBookRequest {
    /// Returns the name of the first field that is empty as sent.
    pub fn missing_field(&self) -> Option<&'static str> {
        missing_field(&self.title, &self.author)
    }
}

impl UpdateBookRequest {
    pub fn missing_field(&self) -> Option<&'static str> {
        missing_field(&self.title, &self.author)
    }
}

fn missing_field(title: &str, author: &str) -> Option<&'static str> {
    if title.is_empty() {
        Some("title")
    } else if author.is_empty() {
        Some("author")
    } else {
        None
    }
}
