//! Recycle-bin items.

pub mod model;

pub use model::{BinItem, BinKind};
