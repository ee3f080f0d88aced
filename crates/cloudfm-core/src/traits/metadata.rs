//! Metadata store trait for document-database backends.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::filter::FilterField;

/// Raw document fields.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A document together with its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Document id within its collection.
    pub id: String,
    /// Document fields.
    pub fields: Document,
}

/// One operation of a batched commit.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or replace a document.
    Set {
        /// Target collection.
        collection: String,
        /// Document id.
        id: String,
        /// Full document body.
        fields: Document,
    },
    /// Delete a document (missing documents are ignored).
    Delete {
        /// Target collection.
        collection: String,
        /// Document id.
        id: String,
    },
}

impl WriteOp {
    /// Build a `Set` operation.
    pub fn set(collection: impl Into<String>, id: impl Into<String>, fields: Document) -> Self {
        Self::Set {
            collection: collection.into(),
            id: id.into(),
            fields,
        }
    }

    /// Build a `Delete` operation.
    pub fn delete(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Delete {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

/// Trait for document-database backends.
///
/// Collections are flat maps from string id to [`Document`]. Queries are a
/// conjunction of field filters.
#[async_trait]
pub trait MetadataStore: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch a document by id.
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>>;

    /// Create or replace a document.
    async fn set(&self, collection: &str, id: &str, fields: Document) -> AppResult<()>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> AppResult<()>;

    /// Return every document matching all `filters`.
    async fn query(
        &self,
        collection: &str,
        filters: &[FilterField],
    ) -> AppResult<Vec<DocumentSnapshot>>;

    /// Apply a set of writes atomically.
    async fn batch_commit(&self, ops: Vec<WriteOp>) -> AppResult<()>;
}
