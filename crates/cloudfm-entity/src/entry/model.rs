//! Entry sum type shown in directory listings.

use serde::{Deserialize, Serialize};

use cloudfm_core::path;

use crate::document::{FileDoc, FolderDoc};

/// Fields shared by files and folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryBase {
    /// Display name.
    pub name: String,
    /// Storage key `{owner}/{folder}/{name}` (no trailing slash).
    pub full_path: String,
    /// Milliseconds since epoch.
    pub created_at: i64,
}

/// A file in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Shared fields.
    #[serde(flatten)]
    pub base: EntryBase,
    /// Parent folder relative to the owner root.
    pub folder: String,
    /// Created as an in-app note.
    pub is_clipboard: bool,
    /// Currently published through an unexpired public share.
    #[serde(default)]
    pub starred: bool,
}

impl FileEntry {
    /// Build an entry from its metadata document.
    pub fn from_doc(doc: &FileDoc) -> Self {
        Self {
            base: EntryBase {
                name: doc.name.clone(),
                full_path: doc.full_path.clone(),
                created_at: doc.created_at,
            },
            folder: doc.folder.clone(),
            is_clipboard: doc.is_clipboard,
            starred: false,
        }
    }

    /// The metadata document describing this entry.
    pub fn to_doc(&self, owner: &str) -> FileDoc {
        FileDoc {
            uid: owner.to_string(),
            name: self.base.name.clone(),
            folder: self.folder.clone(),
            created_at: self.base.created_at,
            full_path: self.base.full_path.clone(),
            is_clipboard: self.is_clipboard,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.base.name
    }

    /// Storage key.
    pub fn full_path(&self) -> &str {
        &self.base.full_path
    }

    /// Metadata document id.
    pub fn doc_id(&self) -> String {
        path::encode_doc_id(&self.base.full_path)
    }
}

/// A folder in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    /// Shared fields.
    #[serde(flatten)]
    pub base: EntryBase,
    /// Parent folder relative to the owner root.
    pub parent: String,
}

impl FolderEntry {
    /// A folder named `name` under `parent` for `owner`.
    pub fn new(owner: &str, parent: &str, name: &str, created_at: i64) -> Self {
        Self {
            base: EntryBase {
                name: name.to_string(),
                full_path: path::owner_path(owner, parent, name),
                created_at,
            },
            parent: parent.to_string(),
        }
    }

    /// Build an entry from its advisory document.
    pub fn from_doc(doc: &FolderDoc, created_at: i64) -> Self {
        Self::new(&doc.uid, &doc.parent, &doc.name, created_at)
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.base.name
    }

    /// Storage key (no trailing slash).
    pub fn full_path(&self) -> &str {
        &self.base.full_path
    }

    /// Folder path relative to the owner root.
    pub fn relative_path(&self) -> String {
        path::join(&self.parent, &self.base.name)
    }
}

/// A listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    /// A blob with content.
    File(FileEntry),
    /// A prefix materialised by a placeholder or descendants.
    Folder(FolderEntry),
}

impl Entry {
    /// Shared fields.
    pub fn base(&self) -> &EntryBase {
        match self {
            Self::File(f) => &f.base,
            Self::Folder(f) => &f.base,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.base().name
    }

    /// Storage key.
    pub fn full_path(&self) -> &str {
        &self.base().full_path
    }

    /// Whether this is a folder.
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }
}

impl From<FileEntry> for Entry {
    fn from(value: FileEntry) -> Self {
        Self::File(value)
    }
}

impl From<FolderEntry> for Entry {
    fn from(value: FolderEntry) -> Self {
        Self::Folder(value)
    }
}
