//! Authenticated endpoints for claiming and managing hosts.
use axum::extract::Path;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::domain_repo;
use crate::db::host_repo::{self, Host};
use crate::error::AppError;
use crate::lifecycle::{self, ClaimRequest};
use crate::{SharedState, auth::Authenticated};

#[derive(Serialize)]
pub struct HostDto {
    pub id: i64,
    pub fqdn: String,
    pub subdomain: String,
    pub domain: String,
    pub comment: Option<String>,
    pub last_update_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl HostDto {
    fn new(host: &Host, domain_name: &str) -> Self {
        HostDto {
            id: host.id,
            fqdn: lifecycle::fqdn(&host.subdomain, domain_name),
            subdomain: host.subdomain.clone(),
            domain: domain_name.to_string(),
            comment: host.comment.clone(),
            last_update_at: host.last_update_at,
            created_at: host.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct ClaimHostRequest {
    pub subdomain: String,
    pub domain: String,
    pub comment: Option<String>,
}

/// Claim response. `update_secret` is shown exactly once; only its hash is
/// kept server-side.
#[derive(Serialize)]
pub struct ClaimResponse {
    pub host: HostDto,
    pub update_secret: String,
}

// POST /api/hosts
pub async fn claim(
    Authenticated(user): Authenticated,
    Extension(state): Extension<SharedState>,
    Json(req): Json<ClaimHostRequest>,
) -> Result<Json<ClaimResponse>, AppError> {
    let claimed = lifecycle::claim_host(
        &state.db,
        &user,
        &ClaimRequest {
            subdomain: req.subdomain,
            domain_name: req.domain,
            comment: req.comment,
        },
    )
    .await?;

    Ok(Json(ClaimResponse {
        host: HostDto::new(&claimed.host, &claimed.domain.name),
        update_secret: claimed.secret,
    }))
}

// GET /api/hosts
pub async fn list(
    Authenticated(user): Authenticated,
    Extension(state): Extension<SharedState>,
) -> Result<Json<Vec<HostDto>>, AppError> {
    let hosts = host_repo::list_by_owner(&state.db, user.id)
        .await
        .map_err(AppError::internal)?;

    let mut out = Vec::with_capacity(hosts.len());
    for host in &hosts {
        let domain = domain_repo::find_by_id(&state.db, host.domain_id)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("host references missing domain")))?;
        out.push(HostDto::new(host, &domain.name));
    }
    Ok(Json(out))
}

#[derive(Serialize)]
pub struct HostDetailDto {
    #[serde(flatten)]
    pub host: HostDto,
    /// Published addresses as seen by the authoritative nameserver right
    /// now. Null entries mean "nothing published".
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
}

// GET /api/hosts/{id}
pub async fn detail(
    Authenticated(user): Authenticated,
    Extension(state): Extension<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<HostDetailDto>, AppError> {
    let host = host_repo::find_by_id(&state.db, id)
        .await
        .map_err(AppError::internal)?
        .filter(|h| h.created_by == user.id)
        .ok_or(AppError::NotFound)?;
    let domain = domain_repo::find_by_id(&state.db, host.domain_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("host references missing domain")))?;

    let (v4, v6) = lifecycle::current_addresses(state.dns.as_ref(), &host, &domain).await?;

    Ok(Json(HostDetailDto {
        host: HostDto::new(&host, &domain.name),
        ipv4: v4.map(|a| a.to_string()),
        ipv6: v6.map(|a| a.to_string()),
    }))
}

// DELETE /api/hosts/{id}
pub async fn delete(
    Authenticated(user): Authenticated,
    Extension(state): Extension<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    lifecycle::delete_host(&state.db, state.dns.as_ref(), id, &user).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Serialize)]
pub struct RegeneratedSecretDto {
    pub update_secret: String,
}

// POST /api/hosts/{id}/secret
pub async fn regenerate_secret(
    Authenticated(user): Authenticated,
    Extension(state): Extension<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<RegeneratedSecretDto>, AppError> {
    let secret = lifecycle::regenerate_secret(&state.db, id, &user).await?;
    Ok(Json(RegeneratedSecretDto {
        update_secret: secret,
    }))
}
