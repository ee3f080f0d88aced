//! # cloudfm-entity
//!
//! Domain entity models for cloudfm. Listing entries (`Entry`), the metadata
//! documents persisted in the `files`, `folders` and `publicFiles`
//! collections, and recycle-bin items. All entities derive `Debug`, `Clone`,
//! `Serialize` and `Deserialize`.

pub mod bin;
pub mod document;
pub mod entry;
pub mod share;

pub use bin::{BinItem, BinKind};
pub use document::{FileDoc, FolderDoc, MetadataDocument};
pub use entry::{Entry, EntryBase, FileEntry, FolderEntry};
pub use share::{PublicShare, StarState};
