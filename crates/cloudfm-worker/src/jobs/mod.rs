//! Built-in job implementations.

pub mod share_expiry;

pub use share_expiry::ShareExpiryJob;
