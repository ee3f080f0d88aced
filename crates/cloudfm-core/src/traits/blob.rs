//! Blob store trait for object-storage backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::AppError;
use crate::result::AppResult;

/// One entry of a single-level blob listing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlobListing {
    /// Last path segment of the object or prefix.
    pub name: String,
    /// Content identifier; `None` for prefix-only (folder) entries.
    pub id: Option<String>,
    /// Object size in bytes (0 for prefixes).
    pub size_bytes: u64,
}

impl BlobListing {
    /// Whether this entry is a folder marker rather than an object.
    pub fn is_folder(&self) -> bool {
        self.id.is_none()
    }
}

/// Trait for object-storage buckets.
///
/// Keys are `/`-separated paths with no leading slash. The store has no
/// native directory concept: a "folder" is any prefix that has at least one
/// object beneath it.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Name of the bucket this store addresses.
    fn bucket(&self) -> &str;

    /// List the immediate children of `prefix` (not recursive).
    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobListing>>;

    /// Write an object. Fails with `Conflict` when the key exists and
    /// `overwrite` is false.
    async fn upload(&self, path: &str, data: Bytes, overwrite: bool) -> AppResult<()>;

    /// Read an object into memory.
    async fn download(&self, path: &str) -> AppResult<Bytes>;

    /// Remove a set of objects in one call. Missing keys are ignored.
    async fn remove(&self, paths: &[String]) -> AppResult<()>;

    /// Copy an object to a new key, overwriting the destination.
    async fn copy(&self, from: &str, to: &str) -> AppResult<()> {
        let data = self.download(from).await?;
        self.upload(to, data, true).await
    }

    /// Move an object to a new key.
    ///
    /// The default is copy-then-delete; the source is only removed once the
    /// copy has been read back with a matching length. Backends with a native
    /// rename override this.
    async fn move_object(&self, from: &str, to: &str) -> AppResult<()> {
        let data = self.download(from).await?;
        let expected = data.len();
        self.upload(to, data, false).await?;
        let copied = self.download(to).await?;
        if copied.len() != expected {
            return Err(AppError::storage(format!(
                "Copy verification failed for {from} -> {to}"
            )));
        }
        self.remove(&[from.to_string()]).await
    }

    /// Public URL of an object.
    fn public_url(&self, path: &str) -> String;
}
