//! Public shares ("stars") and their expiry.

pub mod service;

pub use service::{PublicListing, ShareService};
