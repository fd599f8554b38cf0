use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    service::BookError,
    state::AppState,
    types::{CreateBookRequest, UpdateBookRequest},
};

/// Path ids that are not integers cannot name a stored book.
fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

fn bad_json(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

fn empty_field(field: &str) -> AppError {
    AppError::BadRequest(format!("field '{}' must not be empty", field))
}

pub async fn list_books(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let books = state.books.list().await?;
    Ok(Json(books))
}

pub async fn get_book(State(state): State<AppState>, Path(raw_id): Path<String>) -> AppResult<impl IntoResponse> {
    let id = parse_id(&raw_id).ok_or(BookError::NotFound)?;
    let book = state.books.get(id).await?;
    Ok(Json(book))
}

pub async fn create_book(
    State(state): State<AppState>,
    payload: Result<Json<CreateBookRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload.map_err(bad_json)?;
    if let Some(field) = req.missing_field() {
        return Err(empty_field(field));
    }

    let book = state.books.create(req).await?;
    state.metrics.inc_books_created();
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateBookRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    // The body is judged before the id: a malformed body answers 400 even on a
    // non-numeric id.
    let Json(req) = payload.map_err(bad_json)?;
    if let Some(field) = req.missing_field() {
        return Err(empty_field(field));
    }
    let id = parse_id(&raw_id).ok_or(BookError::NotFound)?;

    // Unclassified failures on this path answer 404, not 500; clients of the
    // existing API depend on that status.
    let book = state.books.update(id, req).await.map_err(|e| match e {
        BookError::Internal(cause) => {
            tracing::warn!(book_id = id, error = %cause, "Update failed, answering 404");
            AppError::NotFound(BookError::NotFound.to_string())
        }
        other => other.into(),
    })?;
    state.metrics.inc_books_updated();
    Ok(Json(book))
}

pub async fn delete_book(State(state): State<AppState>, Path(raw_id): Path<String>) -> AppResult<StatusCode> {
    // Deleting an id that names nothing is a no-op.
    let Some(id) = parse_id(&raw_id) else {
        return Ok(StatusCode::NO_CONTENT);
    };
    state.books.delete(id).await?;
    state.metrics.inc_books_deleted();
    Ok(StatusCode::NO_CONTENT)
}
