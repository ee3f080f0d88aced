//! Listing entries.

pub mod model;

pub use model::{Entry, EntryBase, FileEntry, FolderEntry};
