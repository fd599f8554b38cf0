//! Persistence gateway for books.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::types::{title_key, Book, NewBook};

const BOOK_COLUMNS: &str = "id, title, author, created_at, updated_at, deleted_at";

/// Returned (inside the `anyhow::Error`) by `create` and `update` when the store
/// itself rejects a second active book with the same title key.
#[derive(Debug, thiserror::Error)]
#[error("an active book with this title already exists")]
pub struct DuplicateTitle;

fn map_write_error(e: sqlx::Error) -> anyhow::Error {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DuplicateTitle.into(),
        _ => e.into(),
    }
}

#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Fails with [`DuplicateTitle`] when the title collides with an active book.
    async fn create(&self, book: NewBook) -> anyhow::Result<Book>;
    /// Active books, newest id first.
    async fn list_active(&self) -> anyhow::Result<Vec<Book>>;
    async fn find_active(&self, id: i64) -> anyhow::Result<Option<Book>>;
    /// Persists title/author of `book` and refreshes `updated_at`; returns the stored row.
    /// Fails with [`DuplicateTitle`] like `create`.
    async fn update(&self, book: &Book) -> anyhow::Result<Book>;
    async fn soft_delete(&self, id: i64) -> anyhow::Result<()>;
    /// Case-insensitive, whitespace-trimmed title match among active books.
    async fn exists_active_title(&self, title: &str) -> anyhow::Result<bool>;
    async fn exists_active_title_except(&self, title: &str, id: i64) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct SqliteBookRepository {
    db: SqlitePool,
}

impl SqliteBookRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn create(&self, book: NewBook) -> anyhow::Result<Book> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, Book>(&format!(
            "INSERT INTO books (title, title_key, author, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4) RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(title_key(&book.title))
        .bind(book.author)
        .bind(now)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?;
        Ok(created)
    }

    async fn list_active(&self) -> anyhow::Result<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE deleted_at IS NULL ORDER BY id DESC",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(books)
    }

    async fn find_active(&self, id: i64) -> anyhow::Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = ?1 AND deleted_at IS NULL",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(book)
    }

    async fn update(&self, book: &Book) -> anyhow::Result<Book> {
        let updated = sqlx::query_as::<_, Book>(&format!(
            "UPDATE books SET title = ?1, title_key = ?2, author = ?3, updated_at = ?4 WHERE id = ?5 RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(title_key(&book.title))
        .bind(&book.author)
        .bind(Utc::now())
        .bind(book.id)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?;
        Ok(updated)
    }

    async fn soft_delete(&self, id: i64) -> anyhow::Result<()> {
        sqlx::query("UPDATE books SET deleted_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn exists_active_title(&self, title: &str) -> anyhow::Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE deleted_at IS NULL AND title_key = ?1",
        )
        .bind(title_key(title))
        .fetch_one(&self.db)
        .await?;
        Ok(count > 0)
    }

    async fn exists_active_title_except(&self, title: &str, id: i64) -> anyhow::Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE deleted_at IS NULL AND id <> ?1 AND title_key = ?2",
        )
        .bind(id)
        .bind(title_key(title))
        .fetch_one(&self.db)
        .await?;
        Ok(count > 0)
    }
}
