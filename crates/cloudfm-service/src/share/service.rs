//! Star/unstar toggling, expiry timers and the expired-share sweep.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use cloudfm_core::config::ShareConfig;
use cloudfm_core::error::AppError;
use cloudfm_core::path;
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::{BlobStore, MetadataStore};
use cloudfm_core::types::{Clock, FilterField, FilterOp, FilterValue};
use cloudfm_entity::{FileEntry, MetadataDocument, PublicShare, StarState};

use crate::context::SessionContext;

/// An unexpired share as shown on the public page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicListing {
    /// The share record.
    pub share: PublicShare,
    /// Public URL of the published copy.
    pub url: String,
}

/// Publishes files under the public prefix for a fixed time.
///
/// Expiry is enforced three ways: reads ignore records whose `expiresAt`
/// has passed, a one-shot timer per star removes the record shortly after
/// expiry, and [`ShareService::purge_expired`] sweeps whatever the timers
/// missed (for example after a restart).
#[derive(Debug, Clone)]
pub struct ShareService {
    /// Live bucket; public copies live under `public_prefix` in it.
    files: Arc<dyn BlobStore>,
    /// Metadata store holding `publicFiles`.
    metadata: Arc<dyn MetadataStore>,
    /// Time source for expiry.
    clock: Arc<dyn Clock>,
    /// TTL and timer settings.
    config: ShareConfig,
    /// Prefix of public copies inside the live bucket.
    public_prefix: String,
    /// One-shot expiry timers.
    timers: TaskTracker,
}

impl ShareService {
    /// Creates a new share service.
    pub fn new(
        files: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        clock: Arc<dyn Clock>,
        config: ShareConfig,
        public_prefix: impl Into<String>,
    ) -> Self {
        Self {
            files,
            metadata,
            clock,
            config,
            public_prefix: public_prefix.into(),
            timers: TaskTracker::new(),
        }
    }

    /// Key of the public copy of `full_path`.
    pub fn public_path(&self, full_path: &str) -> String {
        path::join(&self.public_prefix, full_path)
    }

    /// Public URL of a share's copy.
    pub fn public_url(&self, share: &PublicShare) -> String {
        self.files.public_url(&share.path)
    }

    /// Star an unstarred file or unstar a starred one.
    pub async fn toggle_star(&self, ctx: &SessionContext, file: &FileEntry) -> AppResult<StarState> {
        ctx.ensure_owns(file.full_path())?;
        let doc_id = file.doc_id();
        let now = self.clock.now_millis();

        if let Some(share) = self.load(&doc_id).await? {
            if !share.is_expired(now) {
                self.remove_share(&share).await?;
                info!(owner = %ctx.owner_id, path = %file.full_path(), "File unstarred");
                return Ok(StarState::Unstarred);
            }
        }

        let data = self.files.download(file.full_path()).await.map_err(|e| {
            AppError::storage(format!(
                "Failed to download '{}' to make it public: {}",
                file.name(),
                e.message
            ))
        })?;
        let public_path = self.public_path(file.full_path());
        self.files.upload(&public_path, data, true).await?;

        let share = PublicShare {
            name: file.name().to_string(),
            created_at: now,
            expires_at: now + self.config.ttl().num_milliseconds(),
            path: public_path,
            usr: ctx.owner_id.clone(),
            full_path: file.full_path().to_string(),
        };
        self.metadata
            .set(PublicShare::COLLECTION, &doc_id, share.to_document()?)
            .await?;
        self.schedule_expiry(doc_id);

        info!(
            owner = %ctx.owner_id,
            path = %share.full_path,
            expires_at = share.expires_at,
            "File starred"
        );
        Ok(StarState::Starred {
            expires_at: share.expires_at,
        })
    }

    /// Unexpired shares of the current owner, newest first.
    pub async fn list_active(&self, ctx: &SessionContext) -> AppResult<Vec<PublicShare>> {
        let now = self.clock.now_millis();
        let mut shares: Vec<PublicShare> = self
            .query(&[FilterField::eq("usr", ctx.owner_id.as_str())])
            .await?
            .into_iter()
            .filter(|s| !s.is_expired(now))
            .collect();
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shares)
    }

    /// Doc ids of the current owner's unexpired shares.
    pub async fn starred_ids(&self, ctx: &SessionContext) -> AppResult<HashSet<String>> {
        Ok(self
            .list_active(ctx)
            .await?
            .iter()
            .map(|s| s.doc_id())
            .collect())
    }

    /// Whether `full_path` is currently shared.
    pub async fn is_starred(&self, ctx: &SessionContext, full_path: &str) -> AppResult<bool> {
        ctx.ensure_owns(full_path)?;
        let now = self.clock.now_millis();
        Ok(self
            .load(&path::encode_doc_id(full_path))
            .await?
            .is_some_and(|s| !s.is_expired(now)))
    }

    /// First unexpired share at or beneath `full_path`, if any.
    pub async fn first_starred_within(
        &self,
        ctx: &SessionContext,
        full_path: &str,
    ) -> AppResult<Option<PublicShare>> {
        Ok(self
            .list_active(ctx)
            .await?
            .into_iter()
            .find(|s| path::is_within(full_path, &s.full_path)))
    }

    /// Every unexpired share across owners, newest first.
    pub async fn list_public(&self) -> AppResult<Vec<PublicListing>> {
        let now = self.clock.now_millis();
        let mut shares = self.query(&[FilterField::gt_int("expiresAt", now)]).await?;
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(shares
            .into_iter()
            .map(|share| PublicListing {
                url: self.public_url(&share),
                share,
            })
            .collect())
    }

    /// Remove every share (expired or not) at or beneath `full_path`.
    ///
    /// Used when the shared files themselves are deleted.
    pub async fn revoke_within(&self, ctx: &SessionContext, full_path: &str) -> AppResult<usize> {
        let shares = self
            .query(&[FilterField::eq("usr", ctx.owner_id.as_str())])
            .await?;
        let mut revoked = 0;
        for share in shares
            .iter()
            .filter(|s| path::is_within(full_path, &s.full_path))
        {
            self.remove_share(share).await?;
            revoked += 1;
        }
        if revoked > 0 {
            info!(owner = %ctx.owner_id, path = full_path, revoked, "Revoked public shares");
        }
        Ok(revoked)
    }

    /// Remove the public copy and record of every expired share.
    ///
    /// Per-share failures are logged and skipped. Returns how many shares
    /// were removed.
    pub async fn purge_expired(&self) -> AppResult<usize> {
        let now = self.clock.now_millis();
        let expired = self
            .query(&[FilterField::new(
                "expiresAt",
                FilterOp::Lte,
                FilterValue::Integer(now),
            )])
            .await?;
        let mut purged = 0;
        for share in &expired {
            match self.remove_share(share).await {
                Ok(()) => purged += 1,
                Err(e) => warn!(path = %share.full_path, error = %e, "Failed to purge expired share"),
            }
        }
        if purged > 0 {
            info!(purged, "Purged expired public shares");
        }
        Ok(purged)
    }

    /// Wait for every pending expiry timer to fire.
    pub async fn flush_timers(&self) {
        self.timers.close();
        self.timers.wait().await;
        self.timers.reopen();
    }

    /// Number of timers still pending.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn schedule_expiry(&self, doc_id: String) {
        let delay = Duration::from_millis(
            u64::try_from(self.config.ttl().num_milliseconds()).unwrap_or(0)
                + self.config.timer_buffer_ms,
        );
        let service = self.clone();
        self.timers.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = service.expire_if_due(&doc_id).await {
                warn!(doc_id = %doc_id, error = %e, "Share expiry timer failed");
            }
        });
    }

    /// Remove the share only if it is still present and expired.
    async fn expire_if_due(&self, doc_id: &str) -> AppResult<()> {
        let now = self.clock.now_millis();
        match self.load(doc_id).await? {
            Some(share) if share.is_expired(now) => {
                self.remove_share(&share).await?;
                debug!(path = %share.full_path, "Share expired");
            }
            Some(_) => debug!(doc_id, "Share was renewed, timer ignored"),
            None => debug!(doc_id, "Share already removed"),
        }
        Ok(())
    }

    async fn remove_share(&self, share: &PublicShare) -> AppResult<()> {
        self.files.remove(std::slice::from_ref(&share.path)).await?;
        self.metadata
            .delete(PublicShare::COLLECTION, &share.doc_id())
            .await
    }

    async fn load(&self, doc_id: &str) -> AppResult<Option<PublicShare>> {
        self.metadata
            .get(PublicShare::COLLECTION, doc_id)
            .await?
            .map(PublicShare::from_document)
            .transpose()
    }

    async fn query(&self, filters: &[FilterField]) -> AppResult<Vec<PublicShare>> {
        self.metadata
            .query(PublicShare::COLLECTION, filters)
            .await?
            .into_iter()
            .map(|snap| PublicShare::from_document(snap.fields))
            .collect()
    }
}
