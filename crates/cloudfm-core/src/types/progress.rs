//! Progress reporting for multi-item operations.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// A `(completed, total)` progress snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Items finished so far (successfully or definitively failed).
    pub completed: usize,
    /// Items the operation will process.
    pub total: usize,
}

impl Progress {
    /// Whether every item has been accounted for.
    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {}", self.completed, self.total)
    }
}

/// Publishes progress updates to any number of watchers.
///
/// Cloning a reporter shares the same underlying channel, so concurrent
/// branches of a tree walk can all advance one counter.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: watch::Sender<Progress>,
}

impl ProgressReporter {
    /// Create a reporter and a receiver that observes it.
    pub fn channel() -> (Self, watch::Receiver<Progress>) {
        let (tx, rx) = watch::channel(Progress::default());
        (Self { tx }, rx)
    }

    /// A reporter nobody listens to.
    pub fn detached() -> Self {
        let (tx, _rx) = watch::channel(Progress::default());
        Self { tx }
    }

    /// Reset to `0 of total`.
    pub fn start(&self, total: usize) {
        self.tx.send_replace(Progress {
            completed: 0,
            total,
        });
    }

    /// Mark one more item as finished.
    pub fn advance(&self) {
        self.advance_by(1);
    }

    /// Mark `n` more items as finished.
    pub fn advance_by(&self, n: usize) {
        self.tx.send_modify(|p| p.completed += n);
    }

    /// Jump straight to `total of total`.
    pub fn finish(&self) {
        self.tx.send_modify(|p| p.completed = p.total);
    }

    /// Current snapshot.
    pub fn current(&self) -> Progress {
        *self.tx.borrow()
    }
}
