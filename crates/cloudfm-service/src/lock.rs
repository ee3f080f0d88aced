//! Per-path advisory locks for multi-step mutations.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use cloudfm_core::error::AppError;
use cloudfm_core::path;
use cloudfm_core::result::AppResult;

/// Registry of subtrees currently being mutated.
///
/// Two operations overlap when one path lies within the other. A second
/// overlapping operation fails fast with `Conflict` instead of waiting.
#[derive(Debug, Default)]
pub struct PathLocks {
    held: Mutex<Vec<String>>,
}

/// Held subtrees, released on drop.
#[derive(Debug)]
pub struct PathLease {
    locks: Arc<PathLocks>,
    paths: Vec<String>,
}

impl PathLocks {
    /// Create an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim every path in `paths` or none of them.
    pub fn acquire(self: &Arc<Self>, paths: &[&str]) -> AppResult<PathLease> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        for wanted in paths {
            if let Some(busy) = held
                .iter()
                .find(|h| path::is_within(h, wanted) || path::is_within(wanted, h))
            {
                return Err(AppError::conflict(format!(
                    "An operation on '{busy}' is already in progress"
                )));
            }
        }
        let paths: Vec<String> = paths.iter().map(|p| p.trim_end_matches('/').to_string()).collect();
        held.extend(paths.iter().cloned());
        debug!(paths = ?paths, "Acquired path lease");
        Ok(PathLease {
            locks: Arc::clone(self),
            paths,
        })
    }

    /// Number of held paths.
    pub fn held_count(&self) -> usize {
        self.held.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Drop for PathLease {
    fn drop(&mut self) {
        let mut held = self.locks.held.lock().unwrap_or_else(PoisonError::into_inner);
        for path in &self.paths {
            if let Some(idx) = held.iter().position(|h| h == path) {
                held.swap_remove(idx);
            }
        }
    }
}
