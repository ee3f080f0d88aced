//! Upload admission and upload execution.

pub mod admission;
pub mod service;

pub use admission::{Admission, AdmissionFilter, AdmissionReport, count_tree};
pub use service::{UploadFile, UploadNode, UploadService};
