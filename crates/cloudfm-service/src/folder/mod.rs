//! Folder creation, relocation, deletion and download.

pub mod service;

pub use service::{CollectedFile, FolderService};
