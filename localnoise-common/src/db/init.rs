//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up
//! idempotently. All tables use `CREATE TABLE IF NOT EXISTS`, so calling
//! this on every startup is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pragmas(&pool).await?;

    create_users_table(&pool).await?;
    create_bands_table(&pool).await?;

    Ok(pool)
}

/// Connection-level pragmas
///
/// WAL allows concurrent readers while a band creation is writing.
async fn configure_pragmas(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            city TEXT,
            country TEXT,
            profile_photo TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_bands_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bands (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            city TEXT NOT NULL,
            country TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            genre TEXT,
            description TEXT,
            year_formed INTEGER,
            website TEXT,
            spotify_url TEXT,
            spotify_id TEXT,
            spotify_image_url TEXT,
            is_verified INTEGER NOT NULL DEFAULT 0,
            youtube_url TEXT,
            instagram_url TEXT,
            twitter_url TEXT,
            tiktok_url TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            added_by TEXT NOT NULL REFERENCES users(id),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // City filter drives the nearby-band lookup on every creation
    sqlx::query("CREATE INDEX IF NOT EXISTS bands_city_idx ON bands (city)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS bands_location_idx ON bands (latitude, longitude)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_creates_tables() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("localnoise.db");

        let pool = init_database(&db_path).await.expect("init should succeed");

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .expect("should list tables");

        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert!(names.contains(&"bands"));
        assert!(names.contains(&"users"));
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("localnoise.db");

        let pool = init_database(&db_path).await.expect("first init");
        drop(pool);
        init_database(&db_path).await.expect("second init should not fail");
    }
}
