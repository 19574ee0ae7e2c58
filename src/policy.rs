//! Blacklist policy: decides whether a candidate subdomain may be claimed.

use regex::Regex;
use tracing::warn;

use crate::db::{Db, blacklist_repo};
use crate::error::AppError;

/// A candidate is rejected when any current pattern matches anywhere inside
/// it (regex search, not anchored). The set is re-read on every call;
/// additions never retroactively invalidate hosts that were claimed earlier.
pub async fn is_allowed(db: &Db, candidate: &str) -> Result<bool, AppError> {
    for pattern in blacklist_repo::patterns(db).await.map_err(AppError::internal)? {
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                // Patterns are validated at insertion time; a row that still
                // fails to compile must not take the whole policy down.
                warn!(pattern, "skipping malformed blacklist pattern: {e}");
                continue;
            }
        };
        if re.is_match(candidate) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Validate and store a new denial pattern.
pub async fn add_pattern(db: &Db, pattern: &str, created_by: Option<i64>) -> Result<(), AppError> {
    Regex::new(pattern)
        .map_err(|e| AppError::validation(format!("invalid blacklist pattern: {e}")))?;

    blacklist_repo::insert(db, pattern, created_by)
        .await
        .map_err(|e| AppError::from_db(e, "blacklist pattern already exists"))?;
    Ok(())
}
