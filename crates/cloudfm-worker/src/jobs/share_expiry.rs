//! Sweep of expired public shares.
//!
//! One-shot timers only live as long as the process that starred the file;
//! this sweep removes whatever they missed.

use std::sync::Arc;

use serde_json::Value;
use tracing;

use cloudfm_core::result::AppResult;
use cloudfm_service::ShareService;

/// Removes the public copy and record of every expired share.
#[derive(Debug, Clone)]
pub struct ShareExpiryJob {
    /// Share service
    shares: Arc<ShareService>,
}

impl ShareExpiryJob {
    /// Create a new share expiry job
    pub fn new(shares: Arc<ShareService>) -> Self {
        Self { shares }
    }

    /// Run one sweep
    pub async fn run(&self) -> AppResult<Value> {
        tracing::debug!("Running share expiry sweep");
        let purged = self.shares.purge_expired().await?;
        Ok(serde_json::json!({
            "task": "share_expiry",
            "expired_shares_removed": purged,
        }))
    }
}
