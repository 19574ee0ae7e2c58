//! Unauthenticated endpoints.
use axum::{Extension, Json};
use serde::Deserialize;

use crate::db::user_repo;
use crate::error::AppError;
use crate::{SharedState, auth::hash_password};

#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

pub async fn signup(
    Extension(state): Extension<SharedState>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.username.trim().is_empty() {
        return Err(AppError::validation("username must not be empty"));
    }
    if req.password.len() < 8 {
        return Err(AppError::validation("password too short (min 8 characters)"));
    }

    let hash = hash_password(&req.password)?;
    user_repo::insert(&state.db, req.username.trim(), &hash)
        .await
        .map_err(|e| AppError::from_db(e, "username already taken"))?;

    Ok(Json(serde_json::json!({ "ok": true })))
}
