use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqlitePool, SqlitePoolOptions},
    Sqlite,
};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::types::title_key;

/// Opens (creating the file if needed) the SQLite pool described by `cfg`.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let db_url = &cfg.url;
    crate::config::ensure_sqlite_parent_dir(db_url)?;
    if !db_url.contains(":memory:") && !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        info!("Creating SQLite database at {}", db_url);
        Sqlite::create_database(db_url).await?;
    }
    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                let _ = sqlx::query("PRAGMA busy_timeout=10000;").execute(&mut *conn).await;
                Ok(())
            })
        })
        .connect(db_url)
        .await?;
    Ok(pool)
}

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    // Pragmas for better durability/performance
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }
    if let Err(e) = sqlx::query("PRAGMA synchronous=NORMAL;").execute(pool).await {
        tracing::warn!("Failed to set synchronous mode: {}", e);
    }

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            title_key TEXT NOT NULL,
            author TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    ensure_title_key(pool).await?;

    // The partial unique index is what keeps concurrent writers from storing two
    // active books with one title; the service's pre-check only gives a clean error.
    let indexes = [
        ("idx_books_deleted_at", "CREATE INDEX IF NOT EXISTS idx_books_deleted_at ON books(deleted_at)"),
        (
            "idx_books_title_key_active",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_books_title_key_active ON books(title_key) WHERE deleted_at IS NULL",
        ),
    ];

    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            match &e {
                sqlx::Error::Database(db_err) => {
                    let msg = db_err.message().to_lowercase();
                    if msg.contains("already exists") || msg.contains("duplicate") {
                        tracing::debug!("Index {} already exists, skipping", name);
                    } else {
                        tracing::warn!("Failed to create index {}: {}", name, e);
                    }
                }
                _ => {
                    tracing::warn!("Failed to create index {}: {}", name, e);
                }
            }
        }
    }

    Ok(())
}

/// Adds and backfills `title_key` on databases created before the column existed.
/// SQLite's `lower()` only folds ASCII, so the key is computed here.
async fn ensure_title_key(pool: &SqlitePool) -> anyhow::Result<()> {
    let has_column: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info('books') WHERE name = 'title_key'")
            .fetch_one(pool)
            .await?;
    if has_column > 0 {
        return Ok(());
    }

    info!("Adding title_key column to books");
    sqlx::query("ALTER TABLE books ADD COLUMN title_key TEXT NOT NULL DEFAULT ''")
        .execute(pool)
        .await?;
    sqlx::query("DROP INDEX IF EXISTS idx_books_title_active").execute(pool).await?;

    let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, title FROM books").fetch_all(pool).await?;
    let mut tx = pool.begin().await?;
    for (id, title) in rows {
        sqlx::query("UPDATE books SET title_key = ?1 WHERE id = ?2")
            .bind(title_key(&title))
            .bind(id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}
