//! Scheduled background tasks for cloudfm.
//!
//! This crate provides:
//! - A cron scheduler for periodic maintenance tasks
//! - The sweep that removes expired public shares

pub mod jobs;
pub mod scheduler;

pub use jobs::ShareExpiryJob;
pub use scheduler::CronScheduler;
