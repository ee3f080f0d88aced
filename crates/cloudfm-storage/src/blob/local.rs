//! Local filesystem blob store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use cloudfm_core::error::{AppError, ErrorKind};
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::{BlobListing, BlobStore};

/// A bucket stored as a directory tree under `{root}/{bucket}`.
///
/// Object-store semantics are kept: directories only exist while something
/// lives beneath them, so empty parents are pruned after removals and moves.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    bucket: String,
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    /// Create a store rooted at `{data_root}/{bucket}`.
    pub async fn new(data_root: &str, bucket: &str, base_url: &str) -> AppResult<Self> {
        let root = PathBuf::from(data_root).join(bucket);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create bucket root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            bucket: bucket.to_string(),
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a key to a path within the bucket root.
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let clean = path.trim_matches('/');
        if clean.split('/').any(|seg| seg == "..") {
            return Err(AppError::validation(format!("Invalid object key: {path}")));
        }
        Ok(self.root.join(clean))
    }

    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Remove now-empty directories between `path` and the bucket root.
    async fn prune_empty_parents(&self, path: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == self.root || !dir.starts_with(&self.root) {
                break;
            }
            if fs::remove_dir(dir).await.is_err() {
                break;
            }
            current = dir.parent();
        }
    }

    fn not_found_or_storage(path: &str, action: &str, e: std::io::Error) -> AppError {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::not_found(format!("Object not found: {path}"))
        } else {
            AppError::with_source(ErrorKind::Storage, format!("Failed to {action}: {path}"), e)
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobListing>> {
        let dir_path = self.resolve(prefix)?;
        if !dir_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut dir = fs::read_dir(&dir_path).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to list: {prefix}"), e)
        })?;

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read directory entry", e)
        })? {
            let meta = entry.metadata().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to get entry metadata", e)
            })?;
            let name = entry.file_name().to_string_lossy().to_string();
            let id = if meta.is_dir() {
                None
            } else {
                let modified = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                    .map(|d| d.as_nanos())
                    .unwrap_or_default();
                Some(format!("{:x}-{:x}", meta.len(), modified))
            };
            entries.push(BlobListing {
                name,
                id,
                size_bytes: if meta.is_dir() { 0 } else { meta.len() },
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn upload(&self, path: &str, data: Bytes, overwrite: bool) -> AppResult<()> {
        let full_path = self.resolve(path)?;
        if !overwrite && fs::try_exists(&full_path).await.unwrap_or(false) {
            return Err(AppError::conflict(format!(
                "Object already exists: {}/{path}",
                self.bucket
            )));
        }
        self.ensure_parent(&full_path).await?;
        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, format!("Failed to write: {path}"), e)
        })?;
        debug!(bucket = %self.bucket, path, bytes = data.len(), "Wrote object");
        Ok(())
    }

    async fn download(&self, path: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(path)?;
        let data = fs::read(&full_path)
            .await
            .map_err(|e| Self::not_found_or_storage(path, "read", e))?;
        Ok(Bytes::from(data))
    }

    async fn remove(&self, paths: &[String]) -> AppResult<()> {
        for path in paths {
            let full_path = self.resolve(path)?;
            match fs::remove_file(&full_path).await {
                Ok(()) => self.prune_empty_parents(&full_path).await,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to delete: {path}"),
                        e,
                    ));
                }
            }
        }
        debug!(bucket = %self.bucket, count = paths.len(), "Removed objects");
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        let from_path = self.resolve(from)?;
        let to_path = self.resolve(to)?;
        self.ensure_parent(&to_path).await?;
        fs::copy(&from_path, &to_path)
            .await
            .map_err(|e| Self::not_found_or_storage(from, "copy", e))?;
        Ok(())
    }

    async fn move_object(&self, from: &str, to: &str) -> AppResult<()> {
        let from_path = self.resolve(from)?;
        let to_path = self.resolve(to)?;
        if fs::try_exists(&to_path).await.unwrap_or(false) {
            return Err(AppError::conflict(format!(
                "Object already exists: {}/{to}",
                self.bucket
            )));
        }
        self.ensure_parent(&to_path).await?;
        fs::rename(&from_path, &to_path)
            .await
            .map_err(|e| Self::not_found_or_storage(from, "move", e))?;
        self.prune_empty_parents(&from_path).await;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}/{path}", self.base_url, self.bucket)
    }
}
