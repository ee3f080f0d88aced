//! Collapsed view of the recycle bucket.
//!
//! Chains of single-child folders are merged into one item named with the
//! whole chain (`Old/Deep/file.txt`). A top-level folder that forks is
//! expanded one level; each branch below the fork is shown as one item.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tracing::{debug, warn};

use cloudfm_core::path;
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::{BlobListing, BlobStore};
use cloudfm_entity::BinItem;

/// Builds the recycle-bin view from blob listings alone.
#[derive(Debug, Clone)]
pub struct RecycleResolver {
    /// Recycle bucket.
    recycle: Arc<dyn BlobStore>,
}

impl RecycleResolver {
    /// Creates a new resolver over the recycle bucket.
    pub fn new(recycle: Arc<dyn BlobStore>) -> Self {
        Self { recycle }
    }

    /// Every bin item of `owner`, in top-level listing order.
    ///
    /// Top-level entries are resolved concurrently with expand permission.
    pub async fn resolve_bin(&self, owner: &str) -> AppResult<Vec<BinItem>> {
        let top = self.children(owner).await?;
        let items: Vec<BinItem> = top
            .iter()
            .map(|listing| BinItem::from_listing(owner, listing))
            .collect();
        let resolved = join_all(items.into_iter().map(|item| self.resolve(item, true))).await;
        let flat: Vec<BinItem> = resolved.into_iter().flatten().collect();
        debug!(owner = %owner, items = flat.len(), "Recycle bin resolved");
        Ok(flat)
    }

    /// Resolve one item.
    ///
    /// A branch whose listing fails is returned unresolved.
    pub fn resolve(&self, item: BinItem, expand: bool) -> BoxFuture<'_, Vec<BinItem>> {
        async move {
            if !item.is_folder() {
                return vec![item];
            }
            let children = match self.children(&item.full_path).await {
                Ok(children) => children,
                Err(e) => {
                    warn!(path = %item.full_path, error = %e, "Failed to list recycle branch");
                    return vec![item];
                }
            };
            match children.as_slice() {
                [] => vec![item],
                [only] => self.resolve(item.absorb(only), expand).await,
                many if expand => {
                    let branches = many
                        .iter()
                        .map(|child| self.resolve(item.child(child), false));
                    join_all(branches).await.into_iter().flatten().collect()
                }
                _ => vec![item],
            }
        }
        .boxed()
    }

    async fn children(&self, prefix: &str) -> AppResult<Vec<BlobListing>> {
        let listing = self.recycle.list(prefix).await?;
        Ok(listing
            .into_iter()
            .filter(|entry| !path::is_placeholder(&entry.name))
            .collect())
    }
}
