//! File notes, relocation, deletion and preview.

pub mod service;

pub use service::{FileService, Preview};
