//! Folder metadata document.

use serde::{Deserialize, Serialize};

use cloudfm_core::path;

use super::MetadataDocument;

/// A document in the `folders` collection. Advisory only: folder existence
/// is decided by the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDoc {
    /// Owner id.
    pub uid: String,
    /// Folder name.
    pub name: String,
    /// Parent folder path relative to the owner root (empty for root).
    pub parent: String,
    /// `{uid}/{parent}/{name}/`, always with a trailing slash.
    pub full_path: String,
}

impl FolderDoc {
    /// Build a document for folder `name` inside `parent`.
    pub fn new(uid: impl Into<String>, parent: impl Into<String>, name: impl Into<String>) -> Self {
        let uid = uid.into();
        let parent = parent.into();
        let name = name.into();
        let full_path = path::folder_doc_path(&uid, &path::join(&parent, &name));
        Self {
            uid,
            name,
            parent,
            full_path,
        }
    }

    /// Folder path relative to the owner root.
    pub fn relative_path(&self) -> String {
        path::join(&self.parent, &self.name)
    }
}

impl MetadataDocument for FolderDoc {
    const COLLECTION: &'static str = "folders";

    fn key_path(&self) -> &str {
        &self.full_path
    }
}
