//! Stat database initialization
//!
//! Creates the proof-of-play database and its schema on first run.
//! Initialization is idempotent: re-opening an existing database only
//! re-applies `CREATE TABLE IF NOT EXISTS` statements.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize the stat database connection and create the schema if needed
pub async fn init_stat_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new stat database: {}", db_path.display());
    } else {
        info!("Opened existing stat database: {}", db_path.display());
    }

    // WAL lets the writer task append while query surfaces read
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_stat_table(&pool).await?;

    Ok(pool)
}

/// Create the stat table
///
/// `item_id` and `tag` are empty-string, never NULL, when absent.
/// `sent` is reserved for the transmission subsystem; this core only
/// ever writes 0.
async fn create_stat_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stat (
            id INTEGER PRIMARY KEY,
            fromdt TEXT NOT NULL,
            todt TEXT NOT NULL,
            kind TEXT NOT NULL,
            schedule_id INTEGER NOT NULL,
            layout_id INTEGER NOT NULL,
            item_id TEXT NOT NULL DEFAULT '',
            tag TEXT NOT NULL DEFAULT '',
            sent INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_stat_sent ON stat (sent)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_creates_database_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("library").join("pop.db");

        let pool = init_stat_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stat")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("pop.db");

        let pool = init_stat_database(&db_path).await.unwrap();
        sqlx::query(
            "INSERT INTO stat (fromdt, todt, kind, schedule_id, layout_id) \
             VALUES ('a', 'b', 'item', 1, 2)",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;

        // Re-opening must not disturb existing rows
        let pool = init_stat_database(&db_path).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stat")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
