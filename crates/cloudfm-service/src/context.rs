//! Session context carrying the acting owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cloudfm_core::error::AppError;
use cloudfm_core::path;
use cloudfm_core::result::AppResult;

/// Context for the current session.
///
/// Passed into every service method so each operation knows whose
/// namespace it acts on. Every storage key an operation touches must lie
/// under `{owner_id}/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// The owner id, also the first segment of every owned key.
    pub owner_id: String,
    /// When the session was opened.
    pub opened_at: DateTime<Utc>,
}

impl SessionContext {
    /// Creates a new session context.
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            opened_at: Utc::now(),
        }
    }

    /// Reject keys outside the owner's namespace.
    pub fn ensure_owns(&self, full_path: &str) -> AppResult<()> {
        if full_path != self.owner_id && path::is_within(&self.owner_id, full_path) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "'{full_path}' is outside the current owner's namespace"
            )))
        }
    }
}
