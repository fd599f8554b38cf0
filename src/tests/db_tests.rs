#[cfg(test)]
mod tests {
    use crate::db;
    use crate::tests::memory_pool;
    use sqlx::Row;

    #[tokio::test]
    async fn test_init_db() {
        let pool = memory_pool().await;

        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert!(tables.contains(&"books".to_string()));

        let indexes: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='index' AND tbl_name='books'")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert!(indexes.contains(&"idx_books_deleted_at".to_string()));
        assert!(indexes.contains(&"idx_books_title_key_active".to_string()));
    }

    #[tokio::test]
    async fn test_init_db_is_idempotent() {
        let pool = memory_pool().await;
        sqlx::query("INSERT INTO books (title, title_key, author, created_at, updated_at) VALUES ('Dune', 'dune', 'Herbert', 'x', 'x')")
            .execute(&pool)
            .await
            .unwrap();

        db::init_db(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_deleted_at_defaults_to_null() {
        let pool = memory_pool().await;
        sqlx::query("INSERT INTO books (title, title_key, author, created_at, updated_at) VALUES ('Dune', 'dune', 'Herbert', 'x', 'x')")
            .execute(&pool)
            .await
            .unwrap();

        let row = sqlx::query("SELECT id, deleted_at FROM books").fetch_one(&pool).await.unwrap();
        assert_eq!(row.get::<i64, _>("id"), 1);
        assert!(row.get::<Option<String>, _>("deleted_at").is_none());
    }

    #[tokio::test]
    async fn test_title_key_is_unique_among_active_rows_only() {
        let pool = memory_pool().await;
        let insert = "INSERT INTO books (title, title_key, author, created_at, updated_at, deleted_at) \
                      VALUES (?1, 'dune', 'Herbert', 'x', 'x', ?2)";

        sqlx::query(insert).bind("Dune").bind(Some("x")).execute(&pool).await.unwrap();
        sqlx::query(insert).bind("DUNE").bind(None::<String>).execute(&pool).await.unwrap();
        let err = sqlx::query(insert).bind("dune").bind(None::<String>).execute(&pool).await.unwrap_err();
        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("expected unique violation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_init_db_backfills_title_key_on_old_schema() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE books (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL, author TEXT NOT NULL, \
             created_at TEXT NOT NULL, updated_at TEXT NOT NULL, deleted_at TEXT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("CREATE INDEX idx_books_title_active ON books(lower(title), deleted_at)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO books (title, author, created_at, updated_at) VALUES (' Éclair ', 'x', 'x', 'x')")
            .execute(&pool)
            .await
            .unwrap();

        db::init_db(&pool).await.unwrap();
        db::init_db(&pool).await.unwrap();

        let key: String = sqlx::query_scalar("SELECT title_key FROM books").fetch_one(&pool).await.unwrap();
        assert_eq!(key, "éclair");

        let indexes: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='index' AND tbl_name='books'")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert!(indexes.contains(&"idx_books_title_key_active".to_string()));
        assert!(!indexes.contains(&"idx_books_title_active".to_string()));
    }

    #[tokio::test]
    async fn test_connect_creates_file_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("books.db");
        let cfg = crate::config::DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 2,
        };

        let pool = db::connect(&cfg).await.unwrap();
        db::init_db(&pool).await.unwrap();
        pool.close().await;

        assert!(path.exists());
    }
}
