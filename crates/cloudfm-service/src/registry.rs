//! Wiring of every service over one set of backends.

use std::sync::Arc;

use cloudfm_core::config::AppConfig;
use cloudfm_core::types::Clock;
use cloudfm_storage::StorageManager;

use crate::file::FileService;
use crate::folder::FolderService;
use crate::listing::MetadataReconciler;
use crate::lock::PathLocks;
use crate::recycle::{BinService, RecycleResolver};
use crate::share::ShareService;
use crate::upload::{AdmissionFilter, UploadService};

/// Shared handles to all services.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    /// Public shares and their expiry.
    pub shares: Arc<ShareService>,
    /// Directory listing with self-heal.
    pub reconciler: Arc<MetadataReconciler>,
    /// Folder mutations.
    pub folders: Arc<FolderService>,
    /// File mutations and previews.
    pub files: Arc<FileService>,
    /// Uploads.
    pub uploads: Arc<UploadService>,
    /// Recycle-bin view.
    pub resolver: Arc<RecycleResolver>,
    /// Recycle-bin actions.
    pub bin: Arc<BinService>,
    /// Path leases shared by all mutating services.
    pub locks: Arc<PathLocks>,
}

impl ServiceRegistry {
    /// Build every service over `storage`.
    pub fn new(storage: &StorageManager, config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let locks = PathLocks::new();

        let shares = Arc::new(ShareService::new(
            Arc::clone(&storage.files),
            Arc::clone(&storage.metadata),
            Arc::clone(&clock),
            config.share.clone(),
            config.storage.public_prefix.clone(),
        ));
        let reconciler = Arc::new(MetadataReconciler::new(
            Arc::clone(&storage.files),
            Arc::clone(&storage.metadata),
            Arc::clone(&shares),
            Arc::clone(&clock),
        ));
        let folders = Arc::new(FolderService::new(
            Arc::clone(&storage.files),
            Arc::clone(&storage.recycle),
            Arc::clone(&storage.metadata),
            Arc::clone(&reconciler),
            Arc::clone(&shares),
            Arc::clone(&locks),
            Arc::clone(&clock),
        ));
        let files = Arc::new(FileService::new(
            Arc::clone(&storage.files),
            Arc::clone(&storage.recycle),
            Arc::clone(&storage.metadata),
            Arc::clone(&reconciler),
            Arc::clone(&shares),
            Arc::clone(&locks),
            Arc::clone(&clock),
        ));
        let uploads = Arc::new(UploadService::new(
            Arc::clone(&storage.files),
            Arc::clone(&storage.metadata),
            AdmissionFilter::from_config(&config.upload),
            clock,
        ));
        let resolver = Arc::new(RecycleResolver::new(Arc::clone(&storage.recycle)));
        let bin = Arc::new(BinService::new(
            Arc::clone(&storage.recycle),
            Arc::clone(&locks),
        ));

        Self {
            shares,
            reconciler,
            folders,
            files,
            uploads,
            resolver,
            bin,
            locks,
        }
    }

    /// Wait for background metadata heals to land.
    ///
    /// Share timers are not awaited; they sleep for the whole share lifetime.
    pub async fn flush_heals(&self) {
        self.reconciler.flush_heals().await;
    }
}
