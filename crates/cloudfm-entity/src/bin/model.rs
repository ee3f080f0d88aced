//! Recycle-bin item model.

use serde::{Deserialize, Serialize};

use cloudfm_core::path;
use cloudfm_core::traits::BlobListing;

/// Kind of a recycle-bin item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinKind {
    /// A backed-up file.
    File,
    /// A prefix with backed-up content beneath it.
    Folder,
}

/// An item shown in the recycle bin.
///
/// After single-child chains are collapsed, `name` may contain `/`
/// (for example `"Old/Deep/file.txt"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinItem {
    /// Display name, possibly a collapsed chain.
    pub name: String,
    /// Key in the recycle bucket.
    pub full_path: String,
    /// Whether this is a file or a folder.
    pub kind: BinKind,
}

impl BinItem {
    /// Map a listing entry under `parent` to a bin item.
    pub fn from_listing(parent: &str, listing: &BlobListing) -> Self {
        Self {
            name: listing.name.clone(),
            full_path: path::join(parent, &listing.name),
            kind: if listing.is_folder() {
                BinKind::Folder
            } else {
                BinKind::File
            },
        }
    }

    /// Merge a sole child into this item: names and paths are concatenated and
    /// the kind becomes the child's.
    pub fn absorb(&self, child: &BlobListing) -> Self {
        self.child(child)
    }

    /// Item for one child of this folder, named through this item's
    /// display name (`A/B` and child `X` give `A/B/X`).
    pub fn child(&self, listing: &BlobListing) -> Self {
        Self {
            name: path::join(&self.name, &listing.name),
            full_path: path::join(&self.full_path, &listing.name),
            kind: if listing.is_folder() {
                BinKind::Folder
            } else {
                BinKind::File
            },
        }
    }

    /// Whether this is a folder.
    pub fn is_folder(&self) -> bool {
        self.kind == BinKind::Folder
    }
}
