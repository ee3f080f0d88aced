//! File metadata document.

use serde::{Deserialize, Serialize};

use cloudfm_core::path;

use super::MetadataDocument;

/// A document in the `files` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDoc {
    /// Owner id.
    pub uid: String,
    /// Display name.
    pub name: String,
    /// Parent folder path relative to the owner root (empty for root).
    pub folder: String,
    /// Creation time, milliseconds since epoch.
    pub created_at: i64,
    /// `{uid}/{folder}/{name}`.
    pub full_path: String,
    /// Created as an in-app note.
    #[serde(default)]
    pub is_clipboard: bool,
}

impl FileDoc {
    /// Build a document for `name` inside `folder`.
    pub fn new(
        uid: impl Into<String>,
        folder: impl Into<String>,
        name: impl Into<String>,
        created_at: i64,
        is_clipboard: bool,
    ) -> Self {
        let uid = uid.into();
        let folder = folder.into();
        let name = name.into();
        let full_path = path::owner_path(&uid, &folder, &name);
        Self {
            uid,
            name,
            folder,
            created_at,
            full_path,
            is_clipboard,
        }
    }

    /// The same document relocated to a new folder and name.
    pub fn relocated(&self, folder: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(
            self.uid.clone(),
            folder,
            name,
            self.created_at,
            self.is_clipboard,
        )
    }
}

impl MetadataDocument for FileDoc {
    const COLLECTION: &'static str = "files";

    fn key_path(&self) -> &str {
        &self.full_path
    }
}
