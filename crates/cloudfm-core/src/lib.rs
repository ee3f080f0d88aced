//! # cloudfm-core
//!
//! Core crate for cloudfm. Contains the unified error system, configuration
//! schemas, the blob/metadata collaborator traits, query and progress types,
//! and the pure path model shared by every other crate.
//!
//! This crate has **no** internal dependencies on other cloudfm crates.

pub mod config;
pub mod error;
pub mod path;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
