//! Host lifecycle coordination: claiming, address updates, secret rotation
//! and deletion, including the cascade that keeps the authoritative zone in
//! step with the host registry.

use std::net::IpAddr;

use tracing::{info, warn};

use crate::db::{Db, domain_repo, host_repo};
use crate::db::domain_repo::{Domain, NewDomain};
use crate::db::host_repo::Host;
use crate::db::user_repo::User;
use crate::dns::{DnsUpdater, RecordKind};
use crate::error::AppError;
use crate::{policy, secrets, validation};

/// Fully-qualified name of a claim: always `subdomain.domain`.
pub fn fqdn(subdomain: &str, domain_name: &str) -> String {
    format!("{subdomain}.{domain_name}")
}

/// Reverse of [`fqdn`]: split on the first dot only, since subdomains are
/// single labels. An input without any dot can never name a host.
pub fn split_fqdn(fqdn: &str) -> Option<(&str, &str)> {
    fqdn.split_once('.')
}

#[derive(Debug)]
pub struct ClaimRequest {
    pub subdomain: String,
    pub domain_name: String,
    pub comment: Option<String>,
}

/// Result of a successful claim. `secret` is the only time the plaintext
/// update secret ever leaves the system.
#[derive(Debug)]
pub struct ClaimedHost {
    pub host: Host,
    pub domain: Domain,
    pub secret: String,
}

/// Claim a free, non-blacklisted subdomain under an existing domain.
///
/// All validation happens before anything is persisted; the unique index on
/// `(subdomain, domain_id)` settles concurrent claims for the same name.
pub async fn claim_host(db: &Db, user: &User, req: &ClaimRequest) -> Result<ClaimedHost, AppError> {
    validation::validate_subdomain_name(&req.subdomain)
        .map_err(|e| AppError::validation(e.to_string()))?;

    if !policy::is_allowed(db, &req.subdomain).await? {
        return Err(AppError::validation("this subdomain is not allowed"));
    }

    let domain = domain_repo::find_by_name(db, &req.domain_name)
        .await
        .map_err(AppError::internal)?
        .ok_or(AppError::NotFound)?;

    if !domain.available_for_everyone && domain.created_by != Some(user.id) {
        return Err(AppError::validation("this domain is not open for claiming"));
    }

    let secret = secrets::generate_secret();
    let hash = secrets::hash_secret(&secret);

    let host_id = host_repo::insert(
        db,
        &req.subdomain,
        domain.id,
        &hash,
        req.comment.as_deref(),
        user.id,
    )
    .await
    .map_err(|e| AppError::from_db(e, "subdomain already claimed under this domain"))?;

    let host = host_repo::find_by_id(db, host_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("host row vanished after insert")))?;

    info!(fqdn = fqdn(&host.subdomain, &domain.name), "host claimed");
    Ok(ClaimedHost {
        host,
        domain,
        secret,
    })
}

/// Look up the host a fully-qualified name refers to.
pub async fn resolve_fqdn(db: &Db, name: &str) -> Result<Option<(Host, Domain)>, AppError> {
    let Some((subdomain, domain_name)) = split_fqdn(name) else {
        return Ok(None);
    };
    host_repo::find_by_parts(db, subdomain, domain_name)
        .await
        .map_err(AppError::internal)
}

/// Accept or reject a client-submitted address update for `name`.
///
/// An unknown name and a wrong secret are indistinguishable to the caller:
/// both fail authentication, so probing cannot reveal which hosts exist.
pub async fn submit_address_update(
    db: &Db,
    dns: &dyn DnsUpdater,
    name: &str,
    presented_secret: &str,
    addr: IpAddr,
) -> Result<(), AppError> {
    let (host, domain) = resolve_fqdn(db, name)
        .await?
        .ok_or(AppError::Authentication)?;

    if !secrets::verify_secret(&host.update_secret_hash, presented_secret) {
        return Err(AppError::Authentication);
    }

    let endpoint = domain.endpoint()?;
    dns.apply_update(name, addr, &endpoint).await?;

    host_repo::touch_last_update(db, host.id)
        .await
        .map_err(AppError::internal)?;

    info!(fqdn = name, %addr, "address update applied");
    Ok(())
}

/// Delete a claim, cascading to the zone.
///
/// The registry row is removed first and unconditionally; it is the source
/// of truth for whether a claim exists. The DNS removal that follows is
/// best-effort, and a failure there leaves a residual record to be cleaned
/// up later rather than resurrecting the host.
pub async fn delete_host(
    db: &Db,
    dns: &dyn DnsUpdater,
    host_id: i64,
    user: &User,
) -> Result<(), AppError> {
    let host = owned_host(db, host_id, user).await?;
    let domain = domain_repo::find_by_id(db, host.domain_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("host references missing domain")))?;

    let name = fqdn(&host.subdomain, &domain.name);
    host_repo::delete(db, host.id)
        .await
        .map_err(AppError::internal)?;

    match domain.endpoint() {
        Ok(endpoint) => {
            if let Err(e) = dns.delete_record(&name, &endpoint).await {
                warn!(fqdn = name, "host deleted but dns record removal failed, \
                       residual record may persist: {e}");
            }
        }
        Err(e) => warn!(fqdn = name, "host deleted but zone endpoint is unusable: {e}"),
    }

    info!(fqdn = name, "host deleted");
    Ok(())
}

/// Issue a replacement update secret, invalidating the previous one.
pub async fn regenerate_secret(db: &Db, host_id: i64, user: &User) -> Result<String, AppError> {
    let host = owned_host(db, host_id, user).await?;

    let secret = secrets::generate_secret();
    host_repo::set_secret_hash(db, host.id, &secrets::hash_secret(&secret))
        .await
        .map_err(AppError::internal)?;

    Ok(secret)
}

/// Currently published A and AAAA addresses for a host, straight from the
/// authoritative nameserver. `None` entries mean "nothing published", which
/// is routine for single-family hosts.
pub async fn current_addresses(
    dns: &dyn DnsUpdater,
    host: &Host,
    domain: &Domain,
) -> Result<(Option<IpAddr>, Option<IpAddr>), AppError> {
    let endpoint = domain.endpoint()?;
    let name = fqdn(&host.subdomain, &domain.name);

    let v4 = dns.query_current_address(&name, RecordKind::A, &endpoint).await?;
    let v6 = dns
        .query_current_address(&name, RecordKind::Aaaa, &endpoint)
        .await?;
    Ok((v4, v6))
}

#[derive(Debug)]
pub struct DomainRequest {
    pub name: String,
    pub nameserver_ip: String,
    pub update_key: String,
    pub update_algorithm: String,
    pub available_for_everyone: bool,
}

/// Register a new authoritative zone in the catalogue.
pub async fn create_domain(db: &Db, user: &User, req: &DomainRequest) -> Result<Domain, AppError> {
    validation::validate_update_key(&req.update_key)
        .map_err(|e| AppError::validation(e.to_string()))?;
    req.nameserver_ip
        .parse::<IpAddr>()
        .map_err(|_| AppError::validation("invalid nameserver ip address"))?;
    if crate::dns::UpdateAlgorithm::from_name(&req.update_algorithm).is_none() {
        return Err(AppError::validation("unsupported update algorithm"));
    }

    let id = domain_repo::insert(
        db,
        &NewDomain {
            name: req.name.trim_end_matches('.').to_ascii_lowercase(),
            nameserver_ip: req.nameserver_ip.clone(),
            update_key: req.update_key.clone(),
            update_algorithm: req.update_algorithm.clone(),
            available_for_everyone: req.available_for_everyone,
            created_by: Some(user.id),
        },
    )
    .await
    .map_err(|e| AppError::from_db(e, "domain name already registered"))?;

    domain_repo::find_by_id(db, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("domain row vanished after insert")))
}

/// Fetch a host and enforce that `user` owns it. A host belonging to someone
/// else is reported as absent, not as forbidden.
async fn owned_host(db: &Db, host_id: i64, user: &User) -> Result<Host, AppError> {
    let host = host_repo::find_by_id(db, host_id)
        .await
        .map_err(AppError::internal)?
        .ok_or(AppError::NotFound)?;
    if host.created_by != user.id {
        return Err(AppError::NotFound);
    }
    Ok(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fqdn_joins_label_and_zone() {
        assert_eq!(fqdn("my-host", "example.org"), "my-host.example.org");
    }

    #[test]
    fn split_takes_first_dot_only() {
        assert_eq!(
            split_fqdn("my-host.example.org"),
            Some(("my-host", "example.org"))
        );
        assert_eq!(split_fqdn("a.b.c"), Some(("a", "b.c")));
        assert_eq!(split_fqdn("noDotsHere"), None);
    }
}
