//! Repository functions for the catalogue of claimable authoritative zones.
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use sqlx::sqlite::SqliteRow;

use crate::dns::{UpdateAlgorithm, ZoneEndpoint};

/// A zone under which subdomains may be claimed, along with everything
/// needed to push signed updates into it.
#[derive(Debug, Clone)]
pub struct Domain {
    pub id: i64,
    pub name: String,
    pub nameserver_ip: String,
    /// Base64-encoded TSIG key. Credential data; never exposed via the API.
    pub update_key: String,
    pub update_algorithm: String,
    pub available_for_everyone: bool,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Domain {
    /// Resolve the stored row into a wire-level endpoint description.
    pub fn endpoint(&self) -> anyhow::Result<ZoneEndpoint> {
        let nameserver_ip = self
            .nameserver_ip
            .parse()
            .with_context(|| format!("domain '{}' has invalid nameserver ip", self.name))?;
        let algorithm = UpdateAlgorithm::from_name(&self.update_algorithm)
            .with_context(|| format!("domain '{}' has unknown update algorithm", self.name))?;

        Ok(ZoneEndpoint {
            origin: self.name.clone(),
            nameserver_ip,
            update_key: self.update_key.clone(),
            algorithm,
        })
    }
}

#[derive(Debug)]
pub struct NewDomain {
    pub name: String,
    pub nameserver_ip: String,
    pub update_key: String,
    pub update_algorithm: String,
    pub available_for_everyone: bool,
    pub created_by: Option<i64>,
}

fn map_row(row: &SqliteRow) -> Domain {
    Domain {
        id: row.get("id"),
        name: row.get("name"),
        nameserver_ip: row.get("nameserver_ip"),
        update_key: row.get("update_key"),
        update_algorithm: row.get("update_algorithm"),
        available_for_everyone: row.get::<i64, _>("available_for_everyone") != 0,
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const COLUMNS: &str = "id, name, nameserver_ip, update_key, update_algorithm, \
                       available_for_everyone, created_by, created_at, updated_at";

/// Insert a new zone. The unique index on `name` rejects duplicates.
pub async fn insert(db: &SqlitePool, domain: &NewDomain) -> sqlx::Result<i64> {
    let now = Utc::now();

    let res = sqlx::query(
        r#"
        INSERT INTO domains (
            name,
            nameserver_ip,
            update_key,
            update_algorithm,
            available_for_everyone,
            created_by,
            created_at,
            updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&domain.name)
    .bind(&domain.nameserver_ip)
    .bind(&domain.update_key)
    .bind(&domain.update_algorithm)
    .bind(if domain.available_for_everyone { 1 } else { 0 })
    .bind(domain.created_by)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(res.last_insert_rowid())
}

pub async fn find_by_name(db: &SqlitePool, name: &str) -> sqlx::Result<Option<Domain>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM domains WHERE name = ?"))
        .bind(name)
        .fetch_optional(db)
        .await?;
    Ok(row.as_ref().map(map_row))
}

pub async fn find_by_id(db: &SqlitePool, id: i64) -> sqlx::Result<Option<Domain>> {
    let row = sqlx::query(&format!("SELECT {COLUMNS} FROM domains WHERE id = ?"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(row.as_ref().map(map_row))
}

/// Zones the given user may claim under: everything public plus the user's
/// own restricted zones.
pub async fn list_available(db: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<Domain>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {COLUMNS} FROM domains
        WHERE available_for_everyone = 1 OR created_by = ?
        ORDER BY name
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(rows.iter().map(map_row).collect())
}
