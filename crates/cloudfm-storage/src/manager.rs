//! Storage manager: the live bucket, the recycle bucket and the metadata
//! store, built from configuration.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use cloudfm_core::config::StorageConfig;
use cloudfm_core::error::AppError;
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::{BlobStore, MetadataStore};

use crate::blob::{LocalBlobStore, MemoryBlobStore};
use crate::metadata::{JsonFileMetadataStore, MemoryMetadataStore};

/// Handles to every backend a session needs.
#[derive(Debug, Clone)]
pub struct StorageManager {
    /// Bucket holding live files (and the public prefix).
    pub files: Arc<dyn BlobStore>,
    /// Bucket holding recycled files.
    pub recycle: Arc<dyn BlobStore>,
    /// Document database.
    pub metadata: Arc<dyn MetadataStore>,
}

impl StorageManager {
    /// Assemble a manager from explicit backends.
    pub fn new(
        files: Arc<dyn BlobStore>,
        recycle: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            files,
            recycle,
            metadata,
        }
    }

    /// Build the backends named by `config.provider`.
    pub async fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let manager = match config.provider.as_str() {
            "local" => {
                let files = LocalBlobStore::new(
                    &config.data_root,
                    &config.files_bucket,
                    &config.public_base_url,
                )
                .await?;
                let recycle = LocalBlobStore::new(
                    &config.data_root,
                    &config.recycle_bucket,
                    &config.public_base_url,
                )
                .await?;
                let metadata_path = PathBuf::from(&config.data_root).join(&config.metadata_file);
                let metadata = JsonFileMetadataStore::open(metadata_path).await?;
                Self::new(Arc::new(files), Arc::new(recycle), Arc::new(metadata))
            }
            "memory" => Self::new(
                Arc::new(MemoryBlobStore::new(config.files_bucket.clone())),
                Arc::new(MemoryBlobStore::new(config.recycle_bucket.clone())),
                Arc::new(MemoryMetadataStore::new()),
            ),
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown storage provider '{other}'"
                )));
            }
        };
        info!(
            provider = %config.provider,
            files = %manager.files.bucket(),
            recycle = %manager.recycle.bucket(),
            "Storage initialised"
        );
        Ok(manager)
    }
}
