//! Authenticated endpoints for the zone catalogue.
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::db::domain_repo::{self, Domain};
use crate::error::AppError;
use crate::lifecycle::{self, DomainRequest};
use crate::{SharedState, auth::Authenticated};

/// Public view of a domain. The update key stays server-side.
#[derive(Serialize)]
pub struct DomainDto {
    pub id: i64,
    pub name: String,
    pub nameserver_ip: String,
    pub update_algorithm: String,
    pub available_for_everyone: bool,
}

impl From<Domain> for DomainDto {
    fn from(d: Domain) -> Self {
        DomainDto {
            id: d.id,
            name: d.name,
            nameserver_ip: d.nameserver_ip,
            update_algorithm: d.update_algorithm,
            available_for_everyone: d.available_for_everyone,
        }
    }
}

// GET /api/domains
pub async fn list(
    Authenticated(user): Authenticated,
    Extension(state): Extension<SharedState>,
) -> Result<Json<Vec<DomainDto>>, AppError> {
    let domains = domain_repo::list_available(&state.db, user.id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(domains.into_iter().map(DomainDto::from).collect()))
}

#[derive(Deserialize)]
pub struct CreateDomainRequest {
    pub name: String,
    pub nameserver_ip: String,
    /// Base64-encoded TSIG key shared with the zone's nameserver.
    pub update_key: String,
    #[serde(default = "default_algorithm")]
    pub update_algorithm: String,
    #[serde(default)]
    pub available_for_everyone: bool,
}

fn default_algorithm() -> String {
    "HMAC_SHA512".to_string()
}

// POST /api/domains
pub async fn create(
    Authenticated(user): Authenticated,
    Extension(state): Extension<SharedState>,
    Json(req): Json<CreateDomainRequest>,
) -> Result<Json<DomainDto>, AppError> {
    let domain = lifecycle::create_domain(
        &state.db,
        &user,
        &DomainRequest {
            name: req.name,
            nameserver_ip: req.nameserver_ip,
            update_key: req.update_key,
            update_algorithm: req.update_algorithm,
            available_for_everyone: req.available_for_everyone,
        },
    )
    .await?;

    Ok(Json(domain.into()))
}
