//! Metadata store persisted as one JSON file.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use cloudfm_core::error::{AppError, ErrorKind};
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::{Document, DocumentSnapshot, MetadataStore, WriteOp};
use cloudfm_core::types::FilterField;

use super::Collections;

/// Metadata collections loaded from and flushed to a JSON file.
///
/// Each write rewrites the file through a temporary sibling and a rename,
/// so a crash never leaves a half-written document set behind.
#[derive(Debug, Clone)]
pub struct JsonFileMetadataStore {
    path: PathBuf,
    collections: Arc<RwLock<Collections>>,
}

impl JsonFileMetadataStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let collections = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Collections::default(),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Metadata,
                    format!("Failed to read metadata file: {}", path.display()),
                    e,
                ));
            }
        };
        info!(path = %path.display(), "Opened metadata store");
        Ok(Self {
            path,
            collections: Arc::new(RwLock::new(collections)),
        })
    }

    async fn persist(&self, collections: &Collections) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(collections)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| self.write_error(e))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes).await.map_err(|e| self.write_error(e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.write_error(e))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Persisted metadata");
        Ok(())
    }

    fn write_error(&self, e: std::io::Error) -> AppError {
        AppError::with_source(
            ErrorKind::Metadata,
            format!("Failed to write metadata file: {}", self.path.display()),
            e,
        )
    }

    async fn mutate(&self, f: impl FnOnce(&mut Collections)) -> AppResult<()> {
        let mut guard = self.collections.write().await;
        let mut next = guard.clone();
        f(&mut next);
        self.persist(&next).await?;
        *guard = next;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for JsonFileMetadataStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        Ok(self.collections.read().await.get(collection, id))
    }

    async fn set(&self, collection: &str, id: &str, fields: Document) -> AppResult<()> {
        self.mutate(|c| c.set(collection, id, fields)).await
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        self.mutate(|c| c.delete(collection, id)).await
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[FilterField],
    ) -> AppResult<Vec<DocumentSnapshot>> {
        Ok(self.collections.read().await.query(collection, filters))
    }

    async fn batch_commit(&self, ops: Vec<WriteOp>) -> AppResult<()> {
        self.mutate(|c| c.apply(ops)).await
    }
}
