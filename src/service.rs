//! Business rules for books: input validation, title uniqueness among active
//! books, soft delete. Every outcome worth keeping is written to the
//! application log under the `books` module.

use std::sync::Arc;

use async_trait::async_trait;

use crate::logger::Logger;
use crate::repository::{BookRepository, DuplicateTitle};
use crate::types::{Book, CreateBookRequest, NewBook, UpdateBookRequest};

const MODULE: &str = "books";

#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error("title and author are required")]
    BadInput,
    #[error("title already exists")]
    TitleConflict,
    #[error("book not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type BookResult<T> = Result<T, BookError>;

#[async_trait]
pub trait BookService: Send + Sync {
    async fn create(&self, request: CreateBookRequest) -> BookResult<Book>;
    async fn list(&self) -> BookResult<Vec<Book>>;
    async fn get(&self, id: i64) -> BookResult<Book>;
    async fn update(&self, id: i64, request: UpdateBookRequest) -> BookResult<Book>;
    async fn delete(&self, id: i64) -> BookResult<()>;
}

pub struct DefaultBookService {
    repository: Arc<dyn BookRepository>,
    log: Logger,
}

impl DefaultBookService {
    pub fn new(repository: Arc<dyn BookRepository>, log: Logger) -> Self {
        Self { repository, log }
    }
}

/// Trims both fields; `None` if either is blank.
fn normalize(title: &str, author: &str) -> Option<(String, String)> {
    let (title, author) = (title.trim(), author.trim());
    if title.is_empty() || author.is_empty() {
        return None;
    }
    Some((title.to_string(), author.to_string()))
}

#[async_trait]
impl BookService for DefaultBookService {
    async fn create(&self, request: CreateBookRequest) -> BookResult<Book> {
        let (title, author) = normalize(&request.title, &request.author).ok_or(BookError::BadInput)?;

        let exists = self.repository.exists_active_title(&title).await.map_err(|e| {
            self.log.error(MODULE, format!("check duplicate failed: {:#}", e));
            e
        })?;
        if exists {
            return Err(BookError::TitleConflict);
        }

        // A concurrent create can still win the race past the check above; the
        // store's unique index catches it.
        let book = self.repository.create(NewBook { title, author }).await.map_err(|e| {
            if e.is::<DuplicateTitle>() {
                return BookError::TitleConflict;
            }
            self.log.error(MODULE, format!("create failed: {:#}", e));
            BookError::Internal(e)
        })?;

        self.log.info(MODULE, format!("created id={} title={}", book.id, book.title));
        Ok(book)
    }

    async fn list(&self) -> BookResult<Vec<Book>> {
        let books = self.repository.list_active().await.map_err(|e| {
            self.log.error(MODULE, format!("list failed: {:#}", e));
            e
        })?;
        Ok(books)
    }

    async fn get(&self, id: i64) -> BookResult<Book> {
        match self.repository.find_active(id).await {
            Ok(Some(book)) => Ok(book),
            Ok(None) => Err(BookError::NotFound),
            Err(e) => {
                self.log.error(MODULE, format!("get failed id={}: {:#}", id, e));
                Err(e.into())
            }
        }
    }

    async fn update(&self, id: i64, request: UpdateBookRequest) -> BookResult<Book> {
        let (title, author) = normalize(&request.title, &request.author).ok_or(BookError::BadInput)?;

        let mut book = self.repository.find_active(id).await?.ok_or(BookError::NotFound)?;

        let exists = self.repository.exists_active_title_except(&title, id).await.map_err(|e| {
            self.log.error(MODULE, format!("check duplicate failed: {:#}", e));
            e
        })?;
        if exists {
            return Err(BookError::TitleConflict);
        }

        book.title = title;
        book.author = author;

        let book = self.repository.update(&book).await.map_err(|e| {
            if e.is::<DuplicateTitle>() {
                return BookError::TitleConflict;
            }
            self.log.error(MODULE, format!("update failed id={}: {:#}", id, e));
            BookError::Internal(e)
        })?;

        self.log.info(MODULE, format!("updated id={} title={}", book.id, book.title));
        Ok(book)
    }

    async fn delete(&self, id: i64) -> BookResult<()> {
        self.repository.soft_delete(id).await.map_err(|e| {
            self.log.error(MODULE, format!("delete failed id={}: {:#}", id, e));
            e
        })?;
        self.log.info(MODULE, format!("deleted id={}", id));
        Ok(())
    }
}
