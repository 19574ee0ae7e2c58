//! Repository functions for rows in the `users` table.
//!
//! Account handling here is deliberately minimal: hosts and domains need an
//! owner reference and the API boundary needs Basic-auth lookups, nothing
//! more.
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn find_by_username(db: &SqlitePool, username: &str) -> sqlx::Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, username, password_hash, created_at, updated_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(db)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }))
}

/// Create a new user row when signup completes successfully.
pub async fn insert(db: &SqlitePool, username: &str, password_hash: &str) -> sqlx::Result<i64> {
    let now = Utc::now();

    let res = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(res.last_insert_rowid())
}
