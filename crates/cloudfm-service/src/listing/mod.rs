//! Directory listing: blob store and metadata store merged per directory.

pub mod reconciler;

pub use reconciler::{DirectoryListing, MetadataReconciler};
