//! Folder operations spanning the blob store and the metadata store.
//!
//! Multi-step operations follow one shape: validate and check conflicts
//! before any I/O, take a path lease, move or copy blobs concurrently, then
//! commit all metadata changes in one batch once every blob step has
//! resolved. Items whose blob step failed keep their old documents.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cloudfm_core::error::AppError;
use cloudfm_core::path;
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::{BlobStore, MetadataStore};
use cloudfm_core::types::{Clock, FilterField, ProgressReporter};
use cloudfm_entity::{FileDoc, FolderDoc, FolderEntry, MetadataDocument};

use crate::context::SessionContext;
use crate::listing::MetadataReconciler;
use crate::lock::PathLocks;
use crate::recycle;
use crate::report::OperationReport;
use crate::share::ShareService;
use crate::walk;

/// One file gathered for a folder download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedFile {
    /// Path inside the download, starting with the folder's own name.
    pub relative_path: String,
    /// File content.
    #[serde(skip)]
    pub data: Bytes,
}

#[derive(Debug, Clone, Copy)]
enum Relocation {
    Rename,
    Move,
}

impl Relocation {
    fn verb(self) -> &'static str {
        match self {
            Self::Rename => "rename",
            Self::Move => "move",
        }
    }

    fn past(self) -> &'static str {
        match self {
            Self::Rename => "renamed",
            Self::Move => "moved",
        }
    }
}

/// Manages folder operations.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Live bucket.
    files: Arc<dyn BlobStore>,
    /// Recycle bucket.
    recycle: Arc<dyn BlobStore>,
    /// Metadata store.
    metadata: Arc<dyn MetadataStore>,
    /// Directory listings for conflict checks.
    reconciler: Arc<MetadataReconciler>,
    /// Share lookups for rename protection.
    shares: Arc<ShareService>,
    /// Subtree leases.
    locks: Arc<PathLocks>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        files: Arc<dyn BlobStore>,
        recycle: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        reconciler: Arc<MetadataReconciler>,
        shares: Arc<ShareService>,
        locks: Arc<PathLocks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            files,
            recycle,
            metadata,
            reconciler,
            shares,
            locks,
            clock,
        }
    }

    /// Create folder `name` inside `parent`.
    ///
    /// The placeholder is written first; if that fails nothing else is
    /// attempted. A failed document write leaves a valid (blob-backed)
    /// folder and is reported as a metadata error.
    pub async fn create_folder(
        &self,
        ctx: &SessionContext,
        parent: &str,
        name: &str,
    ) -> AppResult<FolderEntry> {
        let name = path::validate_name(name)?;
        let parent = parent.trim_matches('/');
        let listing = self.reconciler.list_directory(ctx, parent).await?;
        if listing.find_folder(name).is_some() {
            return Err(AppError::conflict(format!(
                "A folder named '{name}' already exists"
            )));
        }

        let owner = ctx.owner_id.as_str();
        let folder_key = path::owner_path(owner, parent, name);
        let _lease = self.locks.acquire(&[folder_key.as_str()])?;

        self.files
            .upload(&path::placeholder_key(&folder_key), Bytes::new(), true)
            .await
            .map_err(|e| {
                AppError::storage(format!("Failed to create folder '{name}': {}", e.message))
            })?;

        let doc = FolderDoc::new(owner, parent, name);
        self.metadata
            .set(FolderDoc::COLLECTION, &doc.doc_id(), doc.to_document()?)
            .await
            .map_err(|e| {
                AppError::metadata(format!(
                    "Folder '{name}' was created but its metadata was not saved: {}",
                    e.message
                ))
            })?;

        info!(owner = %owner, path = %folder_key, "Folder created");
        Ok(FolderEntry::new(owner, parent, name, self.clock.now_millis()))
    }

    /// Rename a folder in place, rewriting every descendant path.
    pub async fn rename_folder(
        &self,
        ctx: &SessionContext,
        folder: &FolderEntry,
        new_name: &str,
        progress: &ProgressReporter,
    ) -> AppResult<OperationReport> {
        let new_name = path::validate_name(new_name)?;
        self.relocate(ctx, folder, &folder.parent, new_name, progress, Relocation::Rename)
            .await
    }

    /// Move a folder under a new parent directory, keeping its name.
    pub async fn move_folder(
        &self,
        ctx: &SessionContext,
        folder: &FolderEntry,
        new_parent: &str,
        progress: &ProgressReporter,
    ) -> AppResult<OperationReport> {
        let name = folder.name().to_string();
        self.relocate(ctx, folder, new_parent, &name, progress, Relocation::Move)
            .await
    }

    async fn relocate(
        &self,
        ctx: &SessionContext,
        folder: &FolderEntry,
        new_parent: &str,
        new_name: &str,
        progress: &ProgressReporter,
        kind: Relocation,
    ) -> AppResult<OperationReport> {
        ctx.ensure_owns(folder.full_path())?;
        let owner = ctx.owner_id.as_str();
        let new_parent = new_parent.trim_matches('/');
        let old_rel = folder.relative_path();
        let new_rel = path::join(new_parent, new_name);

        if new_rel == old_rel {
            return Ok(OperationReport::unchanged(format!(
                "Folder \"{}\" unchanged.",
                folder.name()
            )));
        }
        if path::is_within(&old_rel, new_parent) {
            return Err(AppError::validation(format!(
                "Cannot {} folder '{}' into itself",
                kind.verb(),
                folder.name()
            )));
        }

        let siblings = self.reconciler.list_directory(ctx, new_parent).await?;
        if let Some(existing) = siblings.find_folder(new_name) {
            if existing.full_path() != folder.full_path() {
                return Err(AppError::conflict(format!(
                    "A folder named '{new_name}' already exists"
                )));
            }
        }

        let old_key = folder.full_path().to_string();
        let new_key = path::directory_key(owner, &new_rel);
        let _lease = self.locks.acquire(&[old_key.as_str(), new_key.as_str()])?;

        if let Some(share) = self.shares.first_starred_within(ctx, &old_key).await? {
            return Err(AppError::forbidden(format!(
                "Cannot {} folder: contains a public file ({}). Make it private first.",
                kind.verb(),
                share.name
            )));
        }

        let (file_docs, folder_docs) = self.descendant_docs(owner, &old_rel).await?;
        let plan: Vec<(String, String)> = walk::collect_object_keys(self.files.as_ref(), &old_key)
            .await?
            .into_iter()
            .filter_map(|from| path::rebase(&from, &old_key, &new_key).map(|to| (from, to)))
            .collect();

        // one step per descendant object, one for the root placeholder and
        // one for the metadata commit
        let root_placeholder = path::placeholder_key(&old_key);
        let has_root_placeholder = plan.iter().any(|(from, _)| *from == root_placeholder);
        let descendants = plan.len() - usize::from(has_root_placeholder);
        let total = descendants + 2;
        progress.start(total);

        let outcomes = join_all(plan.iter().map(|(from, to)| async move {
            let result = self.files.move_object(from, to).await;
            progress.advance();
            (from, result)
        }))
        .await;
        if !has_root_placeholder {
            progress.advance();
        }

        let mut failed: HashSet<&str> = HashSet::new();
        for (from, result) in outcomes {
            if let Err(e) = result {
                warn!(owner = %owner, from = %from, error = %e, "Blob move failed");
                failed.insert(from.as_str());
            }
        }

        let mut ops = Vec::with_capacity((file_docs.len() + folder_docs.len()) * 2);
        for doc in &file_docs {
            if failed.contains(doc.full_path.as_str()) {
                continue;
            }
            let Some(folder_rel) = path::rebase(&doc.folder, &old_rel, &new_rel) else {
                continue;
            };
            ops.push(doc.relocated(folder_rel, doc.name.clone()).set_op()?);
            ops.push(doc.delete_op());
        }
        for doc in &folder_docs {
            let placeholder = path::placeholder_key(doc.full_path.trim_end_matches('/'));
            if failed.contains(placeholder.as_str()) {
                continue;
            }
            let moved = if doc.relative_path() == old_rel {
                FolderDoc::new(owner, new_parent, new_name)
            } else {
                let Some(parent) = path::rebase(&doc.parent, &old_rel, &new_rel) else {
                    continue;
                };
                FolderDoc::new(owner, parent, doc.name.clone())
            };
            ops.push(moved.set_op()?);
            ops.push(doc.delete_op());
        }

        if !ops.is_empty() {
            self.metadata.batch_commit(ops).await.map_err(|e| {
                AppError::metadata(format!(
                    "Folder {}: blobs moved but metadata update failed: {}",
                    kind.verb(),
                    e.message
                ))
            })?;
        }
        progress.advance();

        let moved = plan.len() - failed.len();
        if !failed.is_empty() {
            return Err(AppError::partial_failure(
                format!("Folder {}", kind.verb()),
                moved,
                failed.len(),
                plan.len(),
            ));
        }

        info!(
            owner = %owner,
            from = %old_key,
            to = %new_key,
            objects = moved,
            "Folder {}",
            kind.past()
        );
        Ok(OperationReport::complete(
            match kind {
                Relocation::Rename => {
                    format!("Folder \"{}\" renamed to \"{new_name}\".", folder.name())
                }
                Relocation::Move => format!(
                    "Folder \"{}\" moved to \"/{new_parent}\".",
                    folder.name()
                ),
            },
            total,
        ))
    }

    /// Delete a folder and everything beneath it, backing file content up
    /// into the recycle bucket first.
    ///
    /// Backup failures are logged and counted but do not stop the delete.
    pub async fn delete_folder(
        &self,
        ctx: &SessionContext,
        folder: &FolderEntry,
        progress: &ProgressReporter,
    ) -> AppResult<OperationReport> {
        ctx.ensure_owns(folder.full_path())?;
        let owner = ctx.owner_id.as_str();
        let key = folder.full_path().to_string();
        let rel = folder.relative_path();
        let _lease = self.locks.acquire(&[key.as_str()])?;

        let (file_docs, folder_docs) = self.descendant_docs(owner, &rel).await?;
        let mut keys = walk::collect_object_keys(self.files.as_ref(), &key).await?;

        let backups: Vec<&String> = keys.iter().filter(|k| !path::is_placeholder(k)).collect();
        let total = backups.len() + 2;
        progress.start(total);

        let outcomes = join_all(backups.iter().map(|k| async move {
            let result = recycle::back_up(self.files.as_ref(), self.recycle.as_ref(), k).await;
            progress.advance();
            (*k, result)
        }))
        .await;
        let mut failed = 0;
        for (k, result) in outcomes {
            if let Err(e) = result {
                warn!(owner = %owner, key = %k, error = %e, "Backup to recycle bin failed");
                failed += 1;
            }
        }

        let ops: Vec<_> = file_docs
            .iter()
            .map(MetadataDocument::delete_op)
            .chain(folder_docs.iter().map(MetadataDocument::delete_op))
            .collect();
        if !ops.is_empty() {
            self.metadata.batch_commit(ops).await?;
        }
        progress.advance();

        if let Err(e) = self.shares.revoke_within(ctx, &key).await {
            warn!(owner = %owner, path = %key, error = %e, "Failed to revoke shares of deleted folder");
        }

        let root_placeholder = path::placeholder_key(&key);
        if !keys.contains(&root_placeholder) {
            keys.push(root_placeholder);
        }
        self.files.remove(&keys).await?;
        progress.advance();

        info!(owner = %owner, path = %key, objects = keys.len(), backup_failures = failed, "Folder deleted");
        Ok(OperationReport {
            summary: format!("Folder \"{}\" deleted.", folder.name()),
            completed: total - failed,
            failed,
            total,
        })
    }

    /// Read every file beneath a folder for download.
    ///
    /// Per-file failures are logged; if any occur the call reports a
    /// partial failure.
    pub async fn collect_files(
        &self,
        ctx: &SessionContext,
        folder: &FolderEntry,
        progress: &ProgressReporter,
    ) -> AppResult<Vec<CollectedFile>> {
        ctx.ensure_owns(folder.full_path())?;
        let key = folder.full_path();
        let base = path::parent_of(key);
        let keys: Vec<String> = walk::collect_object_keys(self.files.as_ref(), key)
            .await?
            .into_iter()
            .filter(|k| !path::is_placeholder(k))
            .collect();
        progress.start(keys.len());

        let outcomes = join_all(keys.iter().map(|k| async move {
            let result = self.files.download(k).await;
            progress.advance();
            (k, result)
        }))
        .await;

        let mut collected = Vec::with_capacity(keys.len());
        let mut failed = 0;
        for (k, result) in outcomes {
            match result {
                Ok(data) => collected.push(CollectedFile {
                    relative_path: path::relative_to(&base, k),
                    data,
                }),
                Err(e) => {
                    warn!(key = %k, error = %e, "Failed to read file for folder download");
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            return Err(AppError::partial_failure(
                "Folder download",
                collected.len(),
                failed,
                keys.len(),
            ));
        }
        Ok(collected)
    }

    /// File and folder documents at or beneath `rel`.
    ///
    /// Both queries are range-bounded with the private-use sentinel so that
    /// siblings sharing a name prefix (`projects2`, `projects-archive`)
    /// never match.
    async fn descendant_docs(
        &self,
        owner: &str,
        rel: &str,
    ) -> AppResult<(Vec<FileDoc>, Vec<FolderDoc>)> {
        let nested = format!("{rel}/");
        let folder_prefix = path::folder_doc_path(owner, rel);
        let direct_filters = [FilterField::eq("uid", owner), FilterField::eq("folder", rel)];
        let deeper_filters = [
            FilterField::eq("uid", owner),
            FilterField::gte("folder", nested.as_str()),
            FilterField::lte("folder", path::range_upper_bound(&nested)),
        ];
        let folder_filters = [
            FilterField::eq("uid", owner),
            FilterField::gte("fullPath", folder_prefix.as_str()),
            FilterField::lte("fullPath", path::range_upper_bound(&folder_prefix)),
        ];
        let (direct, deeper, folders) = tokio::try_join!(
            self.metadata.query(FileDoc::COLLECTION, &direct_filters),
            self.metadata.query(FileDoc::COLLECTION, &deeper_filters),
            self.metadata.query(FolderDoc::COLLECTION, &folder_filters),
        )?;
        let files = direct
            .into_iter()
            .chain(deeper)
            .map(|snap| FileDoc::from_document(snap.fields))
            .collect::<AppResult<Vec<_>>>()?;
        let folders = folders
            .into_iter()
            .map(|snap| FolderDoc::from_document(snap.fields))
            .collect::<AppResult<Vec<_>>>()?;
        Ok((files, folders))
    }
}
