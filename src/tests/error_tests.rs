#[cfg(test)]
mod tests {
    use crate::error::{AppError, HandlerError};
    use crate::service::BookError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let error = AppError::BadRequest("Invalid input".to_string());
        assert_eq!(format!("{}", error), "Bad request: Invalid input");

        let error = AppError::NotFound("book not found".to_string());
        assert_eq!(format!("{}", error), "Not found: book not found");

        let error = AppError::Conflict("title already exists".to_string());
        assert_eq!(format!("{}", error), "Conflict: title already exists");
    }

    #[test]
    fn test_app_error_into_response() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT),
            (AppError::PayloadTooLarge("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (AppError::Internal(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::Conflict("title already exists".into()).into_response();
        let body = body_json(response).await;

        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(body["error"]["message"], "title already exists");
        assert_eq!(body["status"], 409);
        assert!(body["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_internal_error_hides_cause() {
        let response = AppError::Internal(anyhow::anyhow!("disk I/O error on books.db")).into_response();

        let attached = response.extensions().get::<HandlerError>().cloned().unwrap();
        assert!(attached.0.contains("disk I/O error"));

        let body = body_json(response).await;
        let text = body.to_string();
        assert!(!text.contains("disk I/O error"));
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert!(body["error"]["details"]["error_id"].as_str().is_some());
    }

    #[test]
    fn test_every_error_response_carries_log_text() {
        let response = AppError::NotFound("book not found".into()).into_response();
        let attached = response.extensions().get::<HandlerError>().unwrap();
        assert_eq!(attached.0, "Not found: book not found");
    }

    #[test]
    fn test_from_book_error() {
        assert!(matches!(AppError::from(BookError::BadInput), AppError::BadRequest(_)));
        assert!(matches!(AppError::from(BookError::TitleConflict), AppError::Conflict(_)));
        assert!(matches!(AppError::from(BookError::NotFound), AppError::NotFound(_)));
        assert!(matches!(
            AppError::from(BookError::Internal(anyhow::anyhow!("db down"))),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn test_from_sqlx_error() {
        assert!(matches!(AppError::from(sqlx::Error::RowNotFound), AppError::NotFound(_)));
        assert!(matches!(AppError::from(sqlx::Error::PoolTimedOut), AppError::Internal(_)));
    }
}
