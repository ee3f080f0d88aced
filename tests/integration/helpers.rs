//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;

use cloudfm_core::config::AppConfig;
use cloudfm_core::path;
use cloudfm_core::traits::{BlobStore, MetadataStore};
use cloudfm_core::types::{Clock, ManualClock, ProgressReporter};
use cloudfm_entity::{FileDoc, FileEntry, FolderDoc, FolderEntry, MetadataDocument};
use cloudfm_service::{DirectoryListing, ServiceRegistry, SessionContext};
use cloudfm_storage::{MemoryBlobStore, MemoryMetadataStore, StorageManager};

/// Test application context on in-memory backends
pub struct TestApp {
    /// Live bucket
    pub files: Arc<MemoryBlobStore>,
    /// Recycle bucket
    pub recycle: Arc<MemoryBlobStore>,
    /// Metadata store
    pub metadata: Arc<MemoryMetadataStore>,
    /// Controllable time source
    pub clock: Arc<ManualClock>,
    /// Wired services
    pub services: ServiceRegistry,
    /// Acting owner
    pub ctx: SessionContext,
}

impl TestApp {
    /// Create a new test application owned by `uid`
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application with explicit configuration
    pub fn with_config(config: AppConfig) -> Self {
        let files = Arc::new(MemoryBlobStore::new("files"));
        let recycle = Arc::new(MemoryBlobStore::new("recycle"));
        let metadata = Arc::new(MemoryMetadataStore::new());
        let clock = Arc::new(ManualClock::at(1_700_000_000_000));
        let storage = StorageManager::new(files.clone(), recycle.clone(), metadata.clone());
        let services = ServiceRegistry::new(&storage, &config, clock.clone());
        Self {
            files,
            recycle,
            metadata,
            clock,
            services,
            ctx: SessionContext::new("uid"),
        }
    }

    /// Put an object in the live bucket without any metadata
    pub async fn put_blob(&self, key: &str, data: &'static [u8]) {
        self.files
            .upload(key, Bytes::from_static(data), true)
            .await
            .expect("put blob");
    }

    /// Put an object in the recycle bucket
    pub async fn put_recycled(&self, key: &str) {
        self.recycle
            .upload(key, Bytes::from_static(b"old"), true)
            .await
            .expect("put recycled");
    }

    /// Create a file with both blob and document
    pub async fn seed_file(&self, folder: &str, name: &str, data: &'static [u8]) -> FileEntry {
        let doc = FileDoc::new("uid", folder, name, self.clock.now_millis(), false);
        self.put_blob(&doc.full_path, data).await;
        self.metadata
            .set(
                FileDoc::COLLECTION,
                &doc.doc_id(),
                doc.to_document().expect("serialize"),
            )
            .await
            .expect("seed doc");
        FileEntry::from_doc(&doc)
    }

    /// Create a folder chain through the folder service
    pub async fn mkdir(&self, rel: &str) -> FolderEntry {
        let rel = rel.trim_matches('/');
        self.services
            .folders
            .create_folder(&self.ctx, &path::parent_of(rel), path::name_of(rel))
            .await
            .expect("create folder")
    }

    /// List a directory
    pub async fn list(&self, directory: &str) -> DirectoryListing {
        self.services
            .reconciler
            .list_directory(&self.ctx, directory)
            .await
            .expect("list directory")
    }

    /// Find a file by its path relative to the owner root
    pub async fn file(&self, rel: &str) -> FileEntry {
        let listing = self.list(&path::parent_of(rel)).await;
        listing
            .find_file(path::name_of(rel))
            .cloned()
            .unwrap_or_else(|| panic!("file {rel} not listed"))
    }

    /// Find a folder by its path relative to the owner root
    pub async fn folder(&self, rel: &str) -> FolderEntry {
        let listing = self.list(&path::parent_of(rel)).await;
        listing
            .find_folder(path::name_of(rel))
            .cloned()
            .unwrap_or_else(|| panic!("folder {rel} not listed"))
    }

    /// Every key in the live bucket
    pub async fn live_keys(&self) -> Vec<String> {
        self.files.keys().await
    }

    /// Every key in the recycle bucket
    pub async fn recycled_keys(&self) -> Vec<String> {
        self.recycle.keys().await
    }

    /// Full paths of every file document
    pub async fn file_doc_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .metadata
            .query(FileDoc::COLLECTION, &[])
            .await
            .expect("query")
            .into_iter()
            .map(|snap| FileDoc::from_document(snap.fields).expect("parse").full_path)
            .collect();
        paths.sort();
        paths
    }

    /// Full paths of every folder document
    pub async fn folder_doc_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .metadata
            .query(FolderDoc::COLLECTION, &[])
            .await
            .expect("query")
            .into_iter()
            .map(|snap| FolderDoc::from_document(snap.fields).expect("parse").full_path)
            .collect();
        paths.sort();
        paths
    }
}

/// A detached progress reporter
pub fn progress() -> ProgressReporter {
    ProgressReporter::detached()
}
