//! Core type definitions used across the cloudfm workspace.

pub mod clock;
pub mod filter;
pub mod progress;

pub use clock::{Clock, ManualClock, SystemClock};
pub use filter::{FilterField, FilterOp, FilterValue};
pub use progress::{Progress, ProgressReporter};
