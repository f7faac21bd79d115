//! User database operations

use localnoise_common::db::User;
use localnoise_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Insert a new user
pub async fn insert_user(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (
            id, username, email, password_hash, city, country, profile_photo,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.city)
    .bind(&user.country)
    .bind(&user.profile_photo)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a user by id
pub async fn find_user_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(|row| user_from_row(&row)).transpose()
}

/// Load a user by email (login lookup)
pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE lower(email) = lower(?)")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    row.map(|row| user_from_row(&row)).transpose()
}

/// True when the username or email is already registered
pub async fn username_or_email_taken(
    pool: &SqlitePool,
    username: &str,
    email: &str,
) -> Result<bool> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS total FROM users
        WHERE lower(username) = lower(?) OR lower(email) = lower(?)
        "#,
    )
    .bind(username)
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok(row.get::<i64, _>("total") > 0)
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let id: String = row.get("id");

    Ok(User {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::Internal(format!("Invalid UUID in database: {}", e)))?,
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        city: row.get("city"),
        country: row.get("country"),
        profile_photo: row.get("profile_photo"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
