//! Metadata reconciler.
//!
//! The blob store is authoritative for what exists; the metadata store
//! carries the attributes (creation time, note flag). A directory listing
//! merges both. Objects without a document are shown immediately with
//! synthesized attributes, and the document is written in the background
//! ("self-heal") so the next listing finds it.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use cloudfm_core::path;
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::{BlobStore, MetadataStore};
use cloudfm_core::types::{Clock, FilterField};
use cloudfm_entity::{FileDoc, FileEntry, FolderEntry, MetadataDocument};

use crate::context::SessionContext;
use crate::share::ShareService;

/// The merged contents of one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryListing {
    /// Directory path relative to the owner root.
    pub directory: String,
    /// Sub-folders, in date-aware order.
    pub folders: Vec<FolderEntry>,
    /// Files, in date-aware order.
    pub files: Vec<FileEntry>,
}

impl DirectoryListing {
    /// Folder with this name, compared case-insensitively.
    pub fn find_folder(&self, name: &str) -> Option<&FolderEntry> {
        let wanted = name.to_lowercase();
        self.folders
            .iter()
            .find(|f| f.name().to_lowercase() == wanted)
    }

    /// File with this name, compared case-insensitively.
    pub fn find_file(&self, name: &str) -> Option<&FileEntry> {
        let wanted = name.to_lowercase();
        self.files.iter().find(|f| f.name().to_lowercase() == wanted)
    }

    /// Whether the directory has no visible entries.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}

/// Produces directory listings and heals missing file documents.
#[derive(Debug, Clone)]
pub struct MetadataReconciler {
    /// Live bucket.
    files: Arc<dyn BlobStore>,
    /// Metadata store.
    metadata: Arc<dyn MetadataStore>,
    /// Share lookups for the `starred` flag.
    shares: Arc<ShareService>,
    /// Time source for synthesized documents.
    clock: Arc<dyn Clock>,
    /// Background heal writes.
    heals: TaskTracker,
    /// Doc ids with a heal in flight.
    pending: Arc<DashSet<String>>,
}

impl MetadataReconciler {
    /// Creates a new reconciler.
    pub fn new(
        files: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        shares: Arc<ShareService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            files,
            metadata,
            shares,
            clock,
            heals: TaskTracker::new(),
            pending: Arc::new(DashSet::new()),
        }
    }

    /// List `directory` (relative to the owner root, empty for root).
    ///
    /// A blob-listing or metadata-query failure is returned to the caller.
    /// Heal failures are only logged.
    pub async fn list_directory(
        &self,
        ctx: &SessionContext,
        directory: &str,
    ) -> AppResult<DirectoryListing> {
        let directory = directory.trim_matches('/');
        let owner = ctx.owner_id.as_str();
        let prefix = format!("{}/", path::directory_key(owner, directory));

        let filters = [
            FilterField::eq("uid", owner),
            FilterField::eq("folder", directory),
        ];
        let (blobs, docs, starred) = tokio::try_join!(
            self.files.list(&prefix),
            self.metadata.query(FileDoc::COLLECTION, &filters),
            self.shares.starred_ids(ctx),
        )?;

        let mut by_path: HashMap<String, FileDoc> = HashMap::with_capacity(docs.len());
        for snap in docs {
            match FileDoc::from_document(snap.fields) {
                Ok(doc) => {
                    by_path.insert(doc.full_path.clone(), doc);
                }
                Err(e) => warn!(doc_id = %snap.id, error = %e, "Skipping malformed file document"),
            }
        }

        let now = self.clock.now_millis();
        let mut folders = Vec::new();
        let mut files = Vec::new();
        for blob in blobs {
            if path::is_placeholder(&blob.name) {
                continue;
            }
            if blob.is_folder() {
                folders.push(FolderEntry::new(owner, directory, &blob.name, now));
                continue;
            }
            let full_path = path::owner_path(owner, directory, &blob.name);
            let doc = match by_path.remove(&full_path) {
                Some(doc) => doc,
                None => {
                    let doc = FileDoc::new(owner, directory, blob.name.as_str(), now, false);
                    self.schedule_heal(doc.clone());
                    doc
                }
            };
            let mut entry = FileEntry::from_doc(&doc);
            entry.starred = starred.contains(&entry.doc_id());
            files.push(entry);
        }

        folders.sort_by(|a, b| path::date_aware_compare(a.name(), b.name()));
        files.sort_by(|a, b| path::date_aware_compare(a.name(), b.name()));

        debug!(
            owner = %owner,
            directory = %directory,
            folders = folders.len(),
            files = files.len(),
            "Listed directory"
        );
        Ok(DirectoryListing {
            directory: directory.to_string(),
            folders,
            files,
        })
    }

    /// Wait for every in-flight heal write.
    pub async fn flush_heals(&self) {
        self.heals.close();
        self.heals.wait().await;
        self.heals.reopen();
    }

    /// Persist a synthesized document unless a heal for it is already
    /// running or a document appeared in the meantime.
    fn schedule_heal(&self, doc: FileDoc) {
        let doc_id = doc.doc_id();
        if !self.pending.insert(doc_id.clone()) {
            return;
        }
        let metadata = Arc::clone(&self.metadata);
        let pending = Arc::clone(&self.pending);
        self.heals.spawn(async move {
            let outcome = async {
                if metadata.get(FileDoc::COLLECTION, &doc_id).await?.is_some() {
                    return Ok(false);
                }
                metadata
                    .set(FileDoc::COLLECTION, &doc_id, doc.to_document()?)
                    .await?;
                Ok::<_, cloudfm_core::AppError>(true)
            }
            .await;
            match outcome {
                Ok(true) => info!(path = %doc.full_path, "Healed missing file metadata"),
                Ok(false) => debug!(path = %doc.full_path, "Metadata appeared before heal"),
                Err(e) => warn!(path = %doc.full_path, error = %e, "Failed to heal file metadata"),
            }
            pending.remove(&doc_id);
        });
    }
}
