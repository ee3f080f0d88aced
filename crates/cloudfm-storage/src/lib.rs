//! # cloudfm-storage
//!
//! Backend implementations of the `BlobStore` and `MetadataStore` traits:
//! in-memory stores with fault injection for tests, a local-filesystem blob
//! store, and a JSON-file metadata store. [`StorageManager`] wires the live
//! bucket, the recycle bucket and the metadata store from configuration.

pub mod blob;
pub mod fault;
pub mod manager;
pub mod metadata;

pub use blob::{LocalBlobStore, MemoryBlobStore};
pub use fault::{FaultInjector, FaultOp};
pub use manager::StorageManager;
pub use metadata::{JsonFileMetadataStore, MemoryMetadataStore};
