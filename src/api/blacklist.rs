//! Authenticated endpoint for denial patterns.
use axum::{Extension, Json};
use serde::Deserialize;

use crate::error::AppError;
use crate::policy;
use crate::{SharedState, auth::Authenticated};

#[derive(Deserialize)]
pub struct AddPatternRequest {
    /// Regex matched as a substring search against candidate subdomains.
    pub pattern: String,
}

// POST /api/blacklist
pub async fn add_pattern(
    Authenticated(user): Authenticated,
    Extension(state): Extension<SharedState>,
    Json(req): Json<AddPatternRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    policy::add_pattern(&state.db, &req.pattern, Some(user.id)).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
