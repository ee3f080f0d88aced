//! Flat and folder-tree uploads.
//!
//! Each admitted file is written blob first, then its document. Uploads
//! overwrite an existing file with the same name, compared without case;
//! the existing spelling is kept.

use std::collections::HashMap;
use std::ops::AddAssign;
use std::sync::Arc;

use bytes::Bytes;
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tracing::{debug, info, warn};

use cloudfm_core::error::AppError;
use cloudfm_core::path;
use cloudfm_core::result::AppResult;
use cloudfm_core::traits::{BlobStore, MetadataStore};
use cloudfm_core::types::{Clock, ProgressReporter};
use cloudfm_entity::{FileDoc, FolderDoc, MetadataDocument};

use super::admission::{Admission, AdmissionFilter, AdmissionReport, count_tree};
use crate::context::SessionContext;
use crate::report::UploadReport;

/// A file selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File name (no directory part).
    pub name: String,
    /// Content.
    pub data: Bytes,
}

impl UploadFile {
    /// A file named `name` holding `data`.
    pub fn new(name: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// One node of a dropped folder tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadNode {
    /// A file.
    File(UploadFile),
    /// A directory and its children.
    Directory {
        /// Directory name.
        name: String,
        /// Nested nodes.
        children: Vec<UploadNode>,
    },
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    uploaded: usize,
    failed: usize,
    folders_created: usize,
}

impl AddAssign for Tally {
    fn add_assign(&mut self, rhs: Self) {
        self.uploaded += rhs.uploaded;
        self.failed += rhs.failed;
        self.folders_created += rhs.folders_created;
    }
}

/// Sibling names already present in one directory, keyed by lowercase name.
#[derive(Debug, Default)]
struct SiblingNames {
    files: HashMap<String, String>,
    folders: HashMap<String, String>,
}

impl SiblingNames {
    /// Name a file upload lands on: the existing spelling when a sibling
    /// matches without case, else `name`, which later uploads then match.
    fn claim_file(&mut self, name: &str) -> String {
        Self::claim(&mut self.files, name)
    }

    /// Like [`Self::claim_file`] for folders. The flag is true when the
    /// folder already exists.
    fn claim_folder(&mut self, name: &str) -> (String, bool) {
        let existed = self.folders.contains_key(&name.to_lowercase());
        (Self::claim(&mut self.folders, name), existed)
    }

    fn claim(slot: &mut HashMap<String, String>, name: &str) -> String {
        slot.entry(name.to_lowercase())
            .or_insert_with(|| name.to_string())
            .clone()
    }
}

/// Manages uploads into the live bucket.
#[derive(Debug, Clone)]
pub struct UploadService {
    /// Live bucket.
    files: Arc<dyn BlobStore>,
    /// Metadata store.
    metadata: Arc<dyn MetadataStore>,
    /// Extension and size rules.
    filter: AdmissionFilter,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        files: Arc<dyn BlobStore>,
        metadata: Arc<dyn MetadataStore>,
        filter: AdmissionFilter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            files,
            metadata,
            filter,
            clock,
        }
    }

    /// The admission rules in force.
    pub fn filter(&self) -> &AdmissionFilter {
        &self.filter
    }

    /// Upload a flat batch of files into `directory`.
    ///
    /// Rejected files are counted and skipped. If nothing is admitted the
    /// call fails with a validation error before any write.
    pub async fn upload_files(
        &self,
        ctx: &SessionContext,
        directory: &str,
        files: &[UploadFile],
        progress: &ProgressReporter,
    ) -> AppResult<UploadReport> {
        let directory = directory.trim_matches('/');
        let (admitted, admission) = self
            .filter
            .screen(files, |f| (f.name.as_str(), f.size()));
        if admitted.is_empty() {
            return Err(AppError::validation(
                admission
                    .summary()
                    .unwrap_or_else(|| "No valid files selected.".to_string()),
            ));
        }

        let owner = ctx.owner_id.as_str();
        let mut siblings = self.sibling_names(owner, directory).await?;
        let targets: Vec<_> = admitted
            .iter()
            .map(|file| (siblings.claim_file(file.name.trim()), *file))
            .collect();

        progress.start(targets.len());
        let outcomes = join_all(targets.iter().map(|(name, file)| async move {
            let result = self.put_file(owner, directory, name, file).await;
            progress.advance();
            (*file, result)
        }))
        .await;

        let mut tally = Tally::default();
        for (file, result) in outcomes {
            match result {
                Ok(()) => tally.uploaded += 1,
                Err(e) => {
                    warn!(owner = %owner, name = %file.name, error = %e, "Upload failed");
                    tally.failed += 1;
                }
            }
        }
        self.finish("Upload", owner, directory, admission, tally)
    }

    /// Upload folder trees into `directory`, recreating their structure.
    ///
    /// The whole tree is screened first; with nothing admitted the call
    /// fails without touching either backend. A folder that cannot be
    /// created is logged and its children are still uploaded.
    pub async fn upload_tree(
        &self,
        ctx: &SessionContext,
        directory: &str,
        nodes: &[UploadNode],
        progress: &ProgressReporter,
    ) -> AppResult<UploadReport> {
        let directory = directory.trim_matches('/');
        let admission = count_tree(&self.filter, nodes);
        if admission.admitted == 0 {
            return Err(AppError::validation("No valid files found to upload."));
        }

        let owner = ctx.owner_id.as_str();
        let siblings = self.sibling_names(owner, directory).await?;
        progress.start(admission.admitted);
        let tally = self
            .upload_nodes(owner, directory.to_string(), siblings, nodes, progress)
            .await;
        self.finish("Folder upload", owner, directory, admission, tally)
    }

    fn upload_nodes<'a>(
        &'a self,
        owner: &'a str,
        folder: String,
        mut siblings: SiblingNames,
        nodes: &'a [UploadNode],
        progress: &'a ProgressReporter,
    ) -> BoxFuture<'a, Tally> {
        async move {
            // names are claimed in order before anything runs concurrently
            let targets: Vec<_> = nodes
                .iter()
                .filter_map(|node| match node {
                    UploadNode::File(file) => {
                        let accepted = self.filter.admit(&file.name, file.size()) == Admission::Accepted;
                        accepted.then(|| (siblings.claim_file(file.name.trim()), false, node))
                    }
                    UploadNode::Directory { name, .. } => {
                        let (name, existed) = siblings.claim_folder(name.trim());
                        Some((name, existed, node))
                    }
                })
                .collect();

            let branches = targets.into_iter().map(|(target, existed, node)| {
                let folder = folder.clone();
                async move {
                    let mut tally = Tally::default();
                    match node {
                        UploadNode::File(file) => {
                            match self.put_file(owner, &folder, &target, file).await {
                                Ok(()) => tally.uploaded += 1,
                                Err(e) => {
                                    warn!(owner = %owner, folder = %folder, name = %file.name, error = %e, "Upload failed");
                                    tally.failed += 1;
                                }
                            }
                            progress.advance();
                        }
                        UploadNode::Directory { children, .. } => {
                            let child = path::join(&folder, &target);
                            if !existed {
                                match self.ensure_folder(owner, &folder, &target).await {
                                    Ok(()) => tally.folders_created += 1,
                                    Err(e) => {
                                        warn!(owner = %owner, folder = %child, error = %e, "Failed to create folder during upload");
                                    }
                                }
                            }
                            let nested = if existed {
                                match self.sibling_names(owner, &child).await {
                                    Ok(names) => names,
                                    Err(e) => {
                                        warn!(owner = %owner, folder = %child, error = %e, "Failed to list folder during upload");
                                        SiblingNames::default()
                                    }
                                }
                            } else {
                                SiblingNames::default()
                            };
                            tally += self
                                .upload_nodes(owner, child, nested, children, progress)
                                .await;
                        }
                    }
                    tally
                }
            });
            let mut total = Tally::default();
            for tally in join_all(branches).await {
                total += tally;
            }
            total
        }
        .boxed()
    }

    /// Names of the files and folders directly inside `directory`.
    async fn sibling_names(&self, owner: &str, directory: &str) -> AppResult<SiblingNames> {
        let prefix = format!("{}/", path::directory_key(owner, directory));
        let mut names = SiblingNames::default();
        for entry in self.files.list(&prefix).await? {
            if path::is_placeholder(&entry.name) {
                continue;
            }
            let slot = if entry.is_folder() {
                &mut names.folders
            } else {
                &mut names.files
            };
            slot.insert(entry.name.to_lowercase(), entry.name);
        }
        Ok(names)
    }

    async fn put_file(
        &self,
        owner: &str,
        folder: &str,
        name: &str,
        file: &UploadFile,
    ) -> AppResult<()> {
        let name = path::validate_name(name)?;
        let doc = FileDoc::new(owner, folder, name, self.clock.now_millis(), false);
        self.files
            .upload(&doc.full_path, file.data.clone(), true)
            .await?;
        self.metadata
            .set(FileDoc::COLLECTION, &doc.doc_id(), doc.to_document()?)
            .await?;
        debug!(path = %doc.full_path, bytes = file.size(), "File uploaded");
        Ok(())
    }

    async fn ensure_folder(&self, owner: &str, parent: &str, name: &str) -> AppResult<()> {
        let name = path::validate_name(name)?;
        let key = path::owner_path(owner, parent, name);
        self.files
            .upload(&path::placeholder_key(&key), Bytes::new(), true)
            .await?;
        let doc = FolderDoc::new(owner, parent, name);
        self.metadata
            .set(FolderDoc::COLLECTION, &doc.doc_id(), doc.to_document()?)
            .await
    }

    fn finish(
        &self,
        operation: &str,
        owner: &str,
        directory: &str,
        admission: AdmissionReport,
        tally: Tally,
    ) -> AppResult<UploadReport> {
        let report = UploadReport {
            admission,
            uploaded: tally.uploaded,
            failed: tally.failed,
            folders_created: tally.folders_created,
        };
        if report.failed > 0 {
            return Err(AppError::partial_failure(
                operation,
                report.uploaded,
                report.failed,
                report.total(),
            ));
        }
        info!(
            owner = %owner,
            directory = %directory,
            uploaded = report.uploaded,
            skipped = admission.oversized_images + admission.invalid_types,
            folders = report.folders_created,
            "{operation} complete"
        );
        Ok(report)
    }
}
