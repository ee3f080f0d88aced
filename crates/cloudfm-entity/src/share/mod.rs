//! Public share records.

pub mod model;

pub use model::{PublicShare, StarState};
