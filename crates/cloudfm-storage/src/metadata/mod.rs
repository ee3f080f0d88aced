//! Metadata store backends.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileMetadataStore;
pub use memory::MemoryMetadataStore;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use cloudfm_core::path;
use cloudfm_core::traits::{Document, DocumentSnapshot, WriteOp};
use cloudfm_core::types::FilterField;

/// Collections keyed by name, each an ordered map of id to document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Collections {
    inner: HashMap<String, BTreeMap<String, Document>>,
}

impl Collections {
    pub(crate) fn get(&self, collection: &str, id: &str) -> Option<Document> {
        self.inner.get(collection)?.get(id).cloned()
    }

    pub(crate) fn set(&mut self, collection: &str, id: &str, fields: Document) {
        self.inner
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    pub(crate) fn delete(&mut self, collection: &str, id: &str) {
        if let Some(docs) = self.inner.get_mut(collection) {
            docs.remove(id);
        }
    }

    pub(crate) fn query(&self, collection: &str, filters: &[FilterField]) -> Vec<DocumentSnapshot> {
        let Some(docs) = self.inner.get(collection) else {
            return Vec::new();
        };
        docs.iter()
            .filter(|(_, fields)| filters.iter().all(|f| f.matches(fields)))
            .map(|(id, fields)| DocumentSnapshot {
                id: id.clone(),
                fields: fields.clone(),
            })
            .collect()
    }

    pub(crate) fn apply(&mut self, ops: Vec<WriteOp>) {
        for op in ops {
            match op {
                WriteOp::Set {
                    collection,
                    id,
                    fields,
                } => self.set(&collection, &id, fields),
                WriteOp::Delete { collection, id } => self.delete(&collection, &id),
            }
        }
    }

    pub(crate) fn len(&self, collection: &str) -> usize {
        self.inner.get(collection).map(BTreeMap::len).unwrap_or(0)
    }
}

/// Key used for fault matching: `{collection}/{decoded path}`.
pub(crate) fn fault_key(collection: &str, id: &str) -> String {
    let decoded = path::decode_doc_id(id).unwrap_or_else(|_| id.to_string());
    format!("{collection}/{decoded}")
}
