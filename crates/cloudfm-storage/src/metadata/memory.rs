//! In-memory metadata store.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use cloudfm_core::result::AppResult;
use cloudfm_core::traits::{Document, DocumentSnapshot, MetadataStore, WriteOp};
use cloudfm_core::types::FilterField;

use super::{Collections, fault_key};
use crate::fault::{FaultInjector, FaultOp};

/// Metadata collections held in memory. Batches apply under one write lock.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    collections: Arc<RwLock<Collections>>,
    faults: Arc<FaultInjector>,
}

impl MemoryMetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fault injector shared by every clone of this store.
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections.read().await.len(collection)
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        self.faults.check(FaultOp::Get, &fault_key(collection, id))?;
        Ok(self.collections.read().await.get(collection, id))
    }

    async fn set(&self, collection: &str, id: &str, fields: Document) -> AppResult<()> {
        self.faults.check(FaultOp::Set, &fault_key(collection, id))?;
        self.collections.write().await.set(collection, id, fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        self.faults.check(FaultOp::Delete, &fault_key(collection, id))?;
        self.collections.write().await.delete(collection, id);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[FilterField],
    ) -> AppResult<Vec<DocumentSnapshot>> {
        self.faults.check(FaultOp::Query, collection)?;
        Ok(self.collections.read().await.query(collection, filters))
    }

    async fn batch_commit(&self, ops: Vec<WriteOp>) -> AppResult<()> {
        for op in &ops {
            let key = match op {
                WriteOp::Set { collection, id, .. } | WriteOp::Delete { collection, id } => {
                    fault_key(collection, id)
                }
            };
            self.faults.check(FaultOp::Commit, &key)?;
        }
        self.collections.write().await.apply(ops);
        Ok(())
    }
}
