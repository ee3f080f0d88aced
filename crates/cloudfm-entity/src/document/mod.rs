//! Metadata documents and their mapping onto raw store documents.

pub mod file;
pub mod folder;

pub use file::FileDoc;
pub use folder::FolderDoc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use cloudfm_core::error::AppError;
use cloudfm_core::path;
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::{Document, WriteOp};

/// A record persisted in one metadata collection, keyed by the encoded path
/// it describes.
pub trait MetadataDocument: Serialize + DeserializeOwned {
    /// Collection name.
    const COLLECTION: &'static str;

    /// Path the document id is derived from.
    fn key_path(&self) -> &str;

    /// Document id (`encode(key_path)`).
    fn doc_id(&self) -> String {
        path::encode_doc_id(self.key_path())
    }

    /// Serialize into raw store fields.
    fn to_document(&self) -> AppResult<Document> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(AppError::internal(format!(
                "{} document serialized to a non-object: {other}",
                Self::COLLECTION
            ))),
        }
    }

    /// Parse raw store fields.
    fn from_document(fields: Document) -> AppResult<Self> {
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    /// A batch `Set` writing this document at its own id.
    fn set_op(&self) -> AppResult<WriteOp> {
        Ok(WriteOp::set(Self::COLLECTION, self.doc_id(), self.to_document()?))
    }

    /// A batch `Delete` removing this document.
    fn delete_op(&self) -> WriteOp {
        WriteOp::delete(Self::COLLECTION, self.doc_id())
    }
}
