//! Dyndns-style address update endpoint.
//!
//! `GET /nic/update?hostname=<fqdn>&myip=<ip>` with Basic auth where the
//! username is the host's fqdn and the password is its update secret. The
//! plain-text response codes (`good`, `badauth`, `dnserr`) follow the
//! convention router and embedded update clients already speak. `myip` is
//! optional and defaults to the connection's remote address.
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, response::IntoResponse};
use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;
use crate::{SharedState, auth, lifecycle};

#[derive(Deserialize)]
pub struct UpdateParams {
    pub hostname: Option<String>,
    pub myip: Option<String>,
}

// GET /nic/update
pub async fn update(
    Extension(state): Extension<SharedState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    Query(params): Query<UpdateParams>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Ok((basic_user, secret)) = auth::basic_credentials(&headers) else {
        return (StatusCode::UNAUTHORIZED, "badauth".to_string());
    };

    let hostname = params.hostname.unwrap_or(basic_user);

    let addr: IpAddr = match params.myip {
        Some(ip) => match ip.parse() {
            Ok(ip) => ip,
            Err(_) => return (StatusCode::BAD_REQUEST, "bad ip address".to_string()),
        },
        None => remote.ip(),
    };

    match lifecycle::submit_address_update(&state.db, state.dns.as_ref(), &hostname, &secret, addr)
        .await
    {
        Ok(()) => (StatusCode::OK, format!("good {addr}")),
        Err(AppError::Authentication) => {
            debug!(fqdn = hostname, "rejected address update");
            (StatusCode::UNAUTHORIZED, "badauth".to_string())
        }
        Err(AppError::DnsTransport(_)) => (StatusCode::BAD_GATEWAY, "dnserr".to_string()),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "911".to_string()),
    }
}
