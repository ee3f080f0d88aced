//! In-memory blob store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use cloudfm_core::error::AppError;
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::{BlobListing, BlobStore};

use super::{listing_prefix, single_level};
use crate::fault::{FaultInjector, FaultOp};

#[derive(Debug, Clone)]
struct StoredObject {
    id: String,
    data: Bytes,
}

/// A bucket held entirely in memory, ordered by key.
///
/// Moves are native (one locked remove-and-insert). Every call passes
/// through a [`FaultInjector`] so tests can fail specific keys.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    bucket: String,
    base_url: String,
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    faults: Arc<FaultInjector>,
}

impl MemoryBlobStore {
    /// Create an empty bucket.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            base_url: "memory://".to_string(),
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            faults: Arc::new(FaultInjector::default()),
        }
    }

    /// Fault injector shared by every clone of this store.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Every key currently stored, in order.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    /// Whether `path` holds an object.
    pub async fn contains(&self, path: &str) -> bool {
        self.objects.read().await.contains_key(path)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list(&self, prefix: &str) -> AppResult<Vec<BlobListing>> {
        self.faults.check(FaultOp::List, prefix)?;
        let prefix = listing_prefix(prefix);
        let objects = self.objects.read().await;
        Ok(single_level(
            &prefix,
            objects
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(k, o)| (k.as_str(), o.id.as_str(), o.data.len() as u64)),
        ))
    }

    async fn upload(&self, path: &str, data: Bytes, overwrite: bool) -> AppResult<()> {
        self.faults.check(FaultOp::Upload, path)?;
        let mut objects = self.objects.write().await;
        if !overwrite && objects.contains_key(path) {
            return Err(AppError::conflict(format!(
                "Object already exists: {}/{path}",
                self.bucket
            )));
        }
        debug!(bucket = %self.bucket, path, bytes = data.len(), "Stored object");
        objects.insert(
            path.to_string(),
            StoredObject {
                id: Uuid::new_v4().to_string(),
                data,
            },
        );
        Ok(())
    }

    async fn download(&self, path: &str) -> AppResult<Bytes> {
        self.faults.check(FaultOp::Download, path)?;
        self.objects
            .read()
            .await
            .get(path)
            .map(|o| o.data.clone())
            .ok_or_else(|| AppError::not_found(format!("Object not found: {}/{path}", self.bucket)))
    }

    async fn remove(&self, paths: &[String]) -> AppResult<()> {
        for path in paths {
            self.faults.check(FaultOp::Remove, path)?;
        }
        let mut objects = self.objects.write().await;
        for path in paths {
            objects.remove(path);
        }
        debug!(bucket = %self.bucket, count = paths.len(), "Removed objects");
        Ok(())
    }

    async fn move_object(&self, from: &str, to: &str) -> AppResult<()> {
        self.faults.check(FaultOp::Move, from)?;
        let mut objects = self.objects.write().await;
        if objects.contains_key(to) {
            return Err(AppError::conflict(format!(
                "Object already exists: {}/{to}",
                self.bucket
            )));
        }
        let object = objects
            .remove(from)
            .ok_or_else(|| AppError::not_found(format!("Object not found: {}/{from}", self.bucket)))?;
        objects.insert(to.to_string(), object);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}{}/{path}", self.base_url, self.bucket)
    }
}
