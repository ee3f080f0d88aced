//! # cloudfm-service
//!
//! Business logic service layer for cloudfm. Each service coordinates the
//! blob store and the metadata store to implement one family of use cases:
//! directory listing with self-heal, folder and file mutations, uploads,
//! the recycle bin and public shares.
//!
//! Services follow constructor injection: all dependencies are provided at
//! construction time via `Arc` references. [`ServiceRegistry`] wires the
//! full set from a [`cloudfm_storage::StorageManager`].

pub mod context;
pub mod file;
pub mod folder;
pub mod listing;
pub mod lock;
pub mod recycle;
pub mod registry;
pub mod report;
pub mod share;
pub mod state;
pub mod upload;

mod walk;

pub use context::SessionContext;
pub use file::{FileService, Preview};
pub use folder::{CollectedFile, FolderService};
pub use listing::{DirectoryListing, MetadataReconciler};
pub use lock::{PathLease, PathLocks};
pub use recycle::{BinService, RecycleResolver};
pub use registry::ServiceRegistry;
pub use report::{OperationReport, UploadReport};
pub use share::{PublicListing, ShareService};
pub use state::DirectoryState;
pub use upload::{
    Admission, AdmissionFilter, AdmissionReport, UploadFile, UploadNode, UploadService, count_tree,
};
