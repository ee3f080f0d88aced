//! Explicit per-session view state.

use std::sync::Arc;

use tokio::sync::RwLock;

use cloudfm_core::path;
use cloudfm_core::result::AppResult;

use crate::context::SessionContext;
use crate::listing::{DirectoryListing, MetadataReconciler};

/// The directory a session is looking at and its last listing.
///
/// The listing is only ever replaced wholesale by [`DirectoryState::refresh`]
/// after an operation, never patched in place.
#[derive(Debug, Clone, Default)]
pub struct DirectoryState {
    inner: Arc<RwLock<DirectoryListing>>,
}

impl DirectoryState {
    /// Start at the owner root with an empty listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current directory relative to the owner root.
    pub async fn current_directory(&self) -> String {
        self.inner.read().await.directory.clone()
    }

    /// Copy of the last listing.
    pub async fn snapshot(&self) -> DirectoryListing {
        self.inner.read().await.clone()
    }

    /// Re-list the current directory and replace the snapshot.
    pub async fn refresh(
        &self,
        reconciler: &MetadataReconciler,
        ctx: &SessionContext,
    ) -> AppResult<DirectoryListing> {
        let directory = self.current_directory().await;
        self.load(reconciler, ctx, &directory).await
    }

    /// Switch to `directory` and list it. On failure the previous state is
    /// kept.
    pub async fn navigate(
        &self,
        reconciler: &MetadataReconciler,
        ctx: &SessionContext,
        directory: &str,
    ) -> AppResult<DirectoryListing> {
        self.load(reconciler, ctx, directory).await
    }

    /// Go to the parent directory. A no-op at the root.
    pub async fn back(
        &self,
        reconciler: &MetadataReconciler,
        ctx: &SessionContext,
    ) -> AppResult<DirectoryListing> {
        let current = self.current_directory().await;
        if current.is_empty() {
            return Ok(self.snapshot().await);
        }
        self.load(reconciler, ctx, &path::parent_of(&current)).await
    }

    async fn load(
        &self,
        reconciler: &MetadataReconciler,
        ctx: &SessionContext,
        directory: &str,
    ) -> AppResult<DirectoryListing> {
        let listing = reconciler.list_directory(ctx, directory).await?;
        *self.inner.write().await = listing.clone();
        Ok(listing)
    }
}
