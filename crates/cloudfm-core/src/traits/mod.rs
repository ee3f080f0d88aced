//! Collaborator traits defined in `cloudfm-core` and implemented by
//! `cloudfm-storage` (or by any vendor adapter).

pub mod blob;
pub mod metadata;

pub use blob::{BlobListing, BlobStore};
pub use metadata::{Document, DocumentSnapshot, MetadataStore, WriteOp};
