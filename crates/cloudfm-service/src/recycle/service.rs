//! Recycle-bin actions: permanent purge and download.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use cloudfm_core::error::AppError;
use cloudfm_core::path;
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::BlobStore;
use cloudfm_entity::BinItem;

use crate::context::SessionContext;
use crate::folder::CollectedFile;
use crate::lock::PathLocks;
use crate::report::OperationReport;
use crate::walk;

/// Manages items already in the recycle bucket.
#[derive(Debug, Clone)]
pub struct BinService {
    /// Recycle bucket.
    recycle: Arc<dyn BlobStore>,
    /// Path leases.
    locks: Arc<PathLocks>,
}

impl BinService {
    /// Creates a new bin service.
    pub fn new(recycle: Arc<dyn BlobStore>, locks: Arc<PathLocks>) -> Self {
        Self { recycle, locks }
    }

    /// Permanently remove a bin item and everything beneath it.
    pub async fn purge(&self, ctx: &SessionContext, item: &BinItem) -> AppResult<OperationReport> {
        ctx.ensure_owns(&item.full_path)?;
        let _lease = self.locks.acquire(&[item.full_path.as_str()])?;

        let keys = if item.is_folder() {
            let mut keys = walk::collect_object_keys(self.recycle.as_ref(), &item.full_path).await?;
            let placeholder = path::placeholder_key(&item.full_path);
            if !keys.contains(&placeholder) {
                keys.push(placeholder);
            }
            keys
        } else {
            vec![item.full_path.clone()]
        };
        self.recycle.remove(&keys).await?;

        info!(owner = %ctx.owner_id, path = %item.full_path, objects = keys.len(), "Bin item purged");
        Ok(OperationReport::complete(
            format!("\"{}\" permanently deleted.", item.name),
            keys.len(),
        ))
    }

    /// Read a bin item's content: the file itself, or every file beneath a
    /// folder. Paths start at the item's last segment.
    pub async fn download(
        &self,
        ctx: &SessionContext,
        item: &BinItem,
    ) -> AppResult<Vec<CollectedFile>> {
        ctx.ensure_owns(&item.full_path)?;
        let base = path::parent_of(&item.full_path);
        let keys: Vec<String> = if item.is_folder() {
            walk::collect_object_keys(self.recycle.as_ref(), &item.full_path)
                .await?
                .into_iter()
                .filter(|k| !path::is_placeholder(k))
                .collect()
        } else {
            vec![item.full_path.clone()]
        };

        let outcomes = join_all(keys.iter().map(|k| async move {
            (k, self.recycle.download(k).await)
        }))
        .await;

        let mut collected = Vec::with_capacity(keys.len());
        let mut failed = 0;
        for (k, result) in outcomes {
            match result {
                Ok(data) => collected.push(CollectedFile {
                    relative_path: path::relative_to(&base, k),
                    data,
                }),
                Err(e) => {
                    warn!(key = %k, error = %e, "Failed to read bin item");
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            return Err(AppError::partial_failure(
                "Bin download",
                collected.len(),
                failed,
                keys.len(),
            ));
        }
        Ok(collected)
    }
}
