pub mod blacklist;
pub mod domains;
pub mod hosts;
pub mod nic;
pub mod public;

use crate::SharedState;
use axum::{
    Extension, Router,
    routing::{get, post},
};

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // public
        .route("/api/signup", post(public::signup))
        // authenticated
        .route("/api/domains", get(domains::list).post(domains::create))
        .route("/api/blacklist", post(blacklist::add_pattern))
        .route("/api/hosts", get(hosts::list).post(hosts::claim))
        .route(
            "/api/hosts/{id}",
            get(hosts::detail).delete(hosts::delete),
        )
        .route("/api/hosts/{id}/secret", post(hosts::regenerate_secret))
        // dyndns update endpoint, authenticated per-host by update secret
        .route("/nic/update", get(nic::update))
        .layer(Extension(state))
}
