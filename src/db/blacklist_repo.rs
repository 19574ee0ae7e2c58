//! Repository functions for blacklisted subdomain patterns.
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Insert a denial pattern. Callers validate that the pattern compiles as a
/// regex before it gets here, so evaluation stays total.
pub async fn insert(db: &SqlitePool, pattern: &str, created_by: Option<i64>) -> sqlx::Result<i64> {
    let now = Utc::now();

    let res = sqlx::query(
        r#"
        INSERT INTO blacklist (pattern, created_by, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(pattern)
    .bind(created_by)
    .bind(now)
    .execute(db)
    .await?;

    Ok(res.last_insert_rowid())
}

/// The full current pattern set. Fetched fresh on every evaluation so
/// additions take effect for the very next claim.
pub async fn patterns(db: &SqlitePool) -> sqlx::Result<Vec<String>> {
    let rows = sqlx::query("SELECT pattern FROM blacklist")
        .fetch_all(db)
        .await?;
    Ok(rows.iter().map(|row| row.get("pattern")).collect())
}
