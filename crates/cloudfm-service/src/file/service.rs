//! Single-file operations spanning the blob store and the metadata store.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cloudfm_core::error::AppError;
use cloudfm_core::path;
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::{BlobStore, MetadataStore};
use cloudfm_core::types::{Clock, ProgressReporter};
use cloudfm_entity::{FileDoc, FileEntry, MetadataDocument};

use crate::context::SessionContext;
use crate::listing::MetadataReconciler;
use crate::lock::PathLocks;
use crate::recycle;
use crate::report::OperationReport;
use crate::share::ShareService;

/// Extensions previewed through their public URL.
const URL_PREVIEW_EXTENSIONS: &[&str] = &[".png", ".jpeg", ".svg", ".jpg", ".pdf"];

/// Extensions that cannot be previewed at all.
const UNSUPPORTED_PREVIEW_EXTENSIONS: &[&str] = &[".doc", ".docx"];

/// How a file can be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Preview {
    /// Decoded text content.
    Text(String),
    /// URL of an image or PDF.
    Url(String),
    /// No preview available for this type.
    Unsupported,
}

/// Manages file operations.
#[derive(Debug, Clone)]
pub struct FileService {
    /// Live bucket.
    files: Arc<dyn BlobStore>,
    /// Recycle bucket.
    recycle: Arc<dyn BlobStore>,
    /// Metadata store.
    metadata: Arc<dyn MetadataStore>,
    /// Directory listings for conflict checks.
    reconciler: Arc<MetadataReconciler>,
    /// Share lookups for rename protection and cleanup.
    shares: Arc<ShareService>,
    /// Path leases.
    locks: Arc<PathLocks>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl FileService {
    /// Creates a new file service.
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

    /// Create a text note in `directory`.
    ///
    /// A blank name picks the first free `file1`, `file2`, ...
    pub async fn create_note(
        &self,
        ctx: &SessionContext,
        directory: &str,
        name: &str,
        content: &str,
    ) -> AppResult<FileEntry> {
        let directory = directory.trim_matches('/');
        let listing = self.reconciler.list_directory(ctx, directory).await?;
        let name = if name.trim().is_empty() {
            (1..)
                .map(|i| format!("file{i}"))
                .find(|candidate| listing.find_file(candidate).is_none())
                .unwrap_or_else(|| "file".to_string())
        } else {
            path::validate_name(name)?.to_string()
        };
        if listing.find_file(&name).is_some() {
            return Err(AppError::conflict(format!(
                "File with this name already exists: '{name}'"
            )));
        }

        let owner = ctx.owner_id.as_str();
        let doc = FileDoc::new(owner, directory, name.as_str(), self.clock.now_millis(), true);
        let _lease = self.locks.acquire(&[doc.full_path.as_str()])?;

        self.files
            .upload(&doc.full_path, Bytes::from(content.to_string()), false)
            .await?;
        self.metadata
            .set(FileDoc::COLLECTION, &doc.doc_id(), doc.to_document()?)
            .await
            .map_err(|e| {
                AppError::metadata(format!(
                    "Note '{name}' was saved but its metadata was not: {}",
                    e.message
                ))
            })?;

        info!(owner = %owner, path = %doc.full_path, bytes = content.len(), "Note created");
        Ok(FileEntry::from_doc(&doc))
    }

    /// Rename a file within its directory.
    pub async fn rename_file(
        &self,
        ctx: &SessionContext,
        file: &FileEntry,
        new_name: &str,
        progress: &ProgressReporter,
    ) -> AppResult<OperationReport> {
        let new_name = path::validate_name(new_name)?;
        let report = self
            .relocate(ctx, file, &file.folder, new_name, progress, true)
            .await?;
        Ok(report)
    }

    /// Move a file to another directory, keeping its name.
    pub async fn move_file(
        &self,
        ctx: &SessionContext,
        file: &FileEntry,
        new_directory: &str,
        progress: &ProgressReporter,
    ) -> AppResult<OperationReport> {
        let name = file.name().to_string();
        self.relocate(ctx, file, new_directory, &name, progress, false)
            .await
    }

    async fn relocate(
        &self,
        ctx: &SessionContext,
        file: &FileEntry,
        new_directory: &str,
        new_name: &str,
        progress: &ProgressReporter,
        is_rename: bool,
    ) -> AppResult<OperationReport> {
        ctx.ensure_owns(file.full_path())?;
        let owner = ctx.owner_id.as_str();
        let new_directory = new_directory.trim_matches('/');
        let new_path = path::owner_path(owner, new_directory, new_name);
        if new_path == file.full_path() {
            return Ok(OperationReport::unchanged(format!(
                "File \"{}\" unchanged.",
                file.name()
            )));
        }

        let listing = self.reconciler.list_directory(ctx, new_directory).await?;
        if let Some(existing) = listing.find_file(new_name) {
            if existing.full_path() != file.full_path() {
                return Err(AppError::conflict(format!(
                    "A file with this name already exists: '{new_name}'"
                )));
            }
        }

        let _lease = self
            .locks
            .acquire(&[file.full_path(), new_path.as_str()])?;
        if self.shares.is_starred(ctx, file.full_path()).await? {
            let verb = if is_rename { "rename" } else { "move" };
            return Err(AppError::forbidden(format!(
                "Cannot {verb} a public file. Make it private first."
            )));
        }

        progress.start(1);
        self.files.move_object(file.full_path(), &new_path).await?;

        let old_doc = match self.metadata.get(FileDoc::COLLECTION, &file.doc_id()).await? {
            Some(fields) => FileDoc::from_document(fields)?,
            None => file.to_doc(owner),
        };
        let mut new_doc = old_doc.relocated(new_directory, new_name);
        if is_rename {
            new_doc.created_at = self.clock.now_millis();
        }
        self.metadata
            .batch_commit(vec![new_doc.set_op()?, old_doc.delete_op()])
            .await
            .map_err(|e| {
                AppError::metadata(format!(
                    "File moved to '{new_path}' but metadata update failed: {}",
                    e.message
                ))
            })?;
        progress.advance();

        info!(owner = %owner, from = %file.full_path(), to = %new_path, "File relocated");
        let summary = if is_rename {
            format!("Renamed \"{}\" to \"{new_name}\".", file.name())
        } else {
            format!("Moved \"{}\" to \"/{new_directory}\".", file.name())
        };
        Ok(OperationReport::complete(summary, 1))
    }

    /// Delete a file, backing it up into the recycle bucket first.
    ///
    /// A failed backup is logged and does not stop the delete. Any public
    /// share of the file is revoked.
    pub async fn delete_file(
        &self,
        ctx: &SessionContext,
        file: &FileEntry,
        progress: &ProgressReporter,
    ) -> AppResult<OperationReport> {
        ctx.ensure_owns(file.full_path())?;
        let _lease = self.locks.acquire(&[file.full_path()])?;
        progress.start(1);

        let mut failed = 0;
        if let Err(e) =
            recycle::back_up(self.files.as_ref(), self.recycle.as_ref(), file.full_path()).await
        {
            warn!(path = %file.full_path(), error = %e, "Backup to recycle bin failed");
            failed = 1;
        }
        if let Err(e) = self.shares.revoke_within(ctx, file.full_path()).await {
            warn!(path = %file.full_path(), error = %e, "Failed to revoke share of deleted file");
        }

        self.files.remove(&[file.full_path().to_string()]).await?;
        self.metadata
            .delete(FileDoc::COLLECTION, &file.doc_id())
            .await?;
        progress.advance();

        info!(owner = %ctx.owner_id, path = %file.full_path(), "File deleted");
        Ok(OperationReport {
            summary: format!("File \"{}\" deleted.", file.name()),
            completed: 1,
            failed,
            total: 1,
        })
    }

    /// Raw file content.
    pub async fn read_bytes(&self, ctx: &SessionContext, file: &FileEntry) -> AppResult<Bytes> {
        ctx.ensure_owns(file.full_path())?;
        self.files.download(file.full_path()).await
    }

    /// File content decoded as text (invalid UTF-8 is replaced).
    pub async fn read_text(&self, ctx: &SessionContext, file: &FileEntry) -> AppResult<String> {
        let data = self.read_bytes(ctx, file).await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// How to preview a file.
    pub async fn preview(&self, ctx: &SessionContext, file: &FileEntry) -> AppResult<Preview> {
        ctx.ensure_owns(file.full_path())?;
        let ext = path::extension_of(file.name()).unwrap_or_default();
        if URL_PREVIEW_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(Preview::Url(self.files.public_url(file.full_path())));
        }
        if UNSUPPORTED_PREVIEW_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(Preview::Unsupported);
        }
        Ok(Preview::Text(self.read_text(ctx, file).await?))
    }
}
