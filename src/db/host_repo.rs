//! Repository functions for claimed hosts (one subdomain under one domain).
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use sqlx::sqlite::SqliteRow;

use super::domain_repo::Domain;

#[derive(Debug, Clone)]
pub struct Host {
    pub id: i64,
    pub subdomain: String,
    pub domain_id: i64,
    /// One-way hash of the update secret; the plaintext is never stored.
    pub update_secret_hash: String,
    pub comment: Option<String>,
    pub created_by: i64,
    /// Set on each accepted address update, null until the first one.
    pub last_update_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn map_row(row: &SqliteRow) -> Host {
    Host {
        id: row.get("id"),
        subdomain: row.get("subdomain"),
        domain_id: row.get("domain_id"),
        update_secret_hash: row.get("update_secret_hash"),
        comment: row.get("comment"),
        created_by: row.get("created_by"),
        last_update_at: row.get("last_update_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const COLUMNS: &str = "id, subdomain, domain_id, update_secret_hash, comment, \
                       created_by, last_update_at, created_at, updated_at";

/// Insert a claim. The unique index on `(subdomain, domain_id)` makes the
/// check-and-insert race a storage-level conflict rather than a lost update.
pub async fn insert(
    db: &SqlitePool,
    subdomain: &str,
    domain_id: i64,
    update_secret_hash: &str,
    comment: Option<&str>,
    created_by: i64,
) -> sqlx::Result<i64> {
    let now = Utc::now();

    let res = sqlx::query(
        r#"
        INSERT INTO hosts (
            subdomain,
            domain_id,
            update_secret_hash,
            comment,
            created_by,
            last_update_at,
            created_at,
            updated_at
        ) VALUES (?, ?, ?, ?, ?, NULL, ?, ?)
        "#,
    )
    .bind(subdomain)
    .bind(domain_id)
    .bind(update_secret_hash)
    .bind(comment)
    .bind(created_by)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(res.last_insert_rowid())
}

pub async fn find_by_id(db: &SqlitePool, id: i64) -> sqlx::Result<Option<Host>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM hosts WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row.as_ref().map(map_row))
}

/// Look up a host by its subdomain label and the exact name of its domain.
/// Returns the domain row as well, since every caller that resolves a host
/// this way goes on to talk to the domain's nameserver.
pub async fn find_by_parts(
    db: &SqlitePool,
    subdomain: &str,
    domain_name: &str,
) -> sqlx::Result<Option<(Host, Domain)>> {
    let row = sqlx::query(
        r#"
        SELECT
            h.id, h.subdomain, h.domain_id, h.update_secret_hash, h.comment,
            h.created_by, h.last_update_at, h.created_at, h.updated_at,
            d.id AS d_id, d.name AS d_name, d.nameserver_ip AS d_nameserver_ip,
            d.update_key AS d_update_key, d.update_algorithm AS d_update_algorithm,
            d.available_for_everyone AS d_available_for_everyone,
            d.created_by AS d_created_by, d.created_at AS d_created_at,
            d.updated_at AS d_updated_at
        FROM hosts h
        JOIN domains d ON d.id = h.domain_id
        WHERE h.subdomain = ? AND d.name = ?
        "#,
    )
    .bind(subdomain)
    .bind(domain_name)
    .fetch_optional(db)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let host = map_row(&row);
    let domain = Domain {
        id: row.get("d_id"),
        name: row.get("d_name"),
        nameserver_ip: row.get("d_nameserver_ip"),
        update_key: row.get("d_update_key"),
        update_algorithm: row.get("d_update_algorithm"),
        available_for_everyone: row.get::<i64, _>("d_available_for_everyone") != 0,
        created_by: row.get("d_created_by"),
        created_at: row.get("d_created_at"),
        updated_at: row.get("d_updated_at"),
    };

    Ok(Some((host, domain)))
}

pub async fn list_by_owner(db: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<Host>> {
    let rows = sqlx::query(&format!(
        "SELECT {COLUMNS} FROM hosts WHERE created_by = ? ORDER BY id"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows.iter().map(map_row).collect())
}

/// Replace the stored secret hash. The previous secret stops verifying
/// immediately; there is no rotation history.
pub async fn set_secret_hash(db: &SqlitePool, host_id: i64, hash: &str) -> sqlx::Result<()> {
    let now = Utc::now();
    sqlx::query("UPDATE hosts SET update_secret_hash = ?, updated_at = ? WHERE id = ?")
        .bind(hash)
        .bind(now)
        .bind(host_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Record an accepted address update.
pub async fn touch_last_update(db: &SqlitePool, host_id: i64) -> sqlx::Result<()> {
    let now = Utc::now();
    sqlx::query("UPDATE hosts SET last_update_at = ?, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(now)
        .bind(host_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Remove the host row. Returns whether a row actually existed.
pub async fn delete(db: &SqlitePool, host_id: i64) -> sqlx::Result<bool> {
    let res = sqlx::query("DELETE FROM hosts WHERE id = ?")
        .bind(host_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
