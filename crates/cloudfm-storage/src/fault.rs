//! Fault injection and call accounting for the in-memory backends.

use dashmap::DashMap;

use cloudfm_core::error::{AppError, ErrorKind};
use cloudfm_core::result::AppResult;

/// Backend operation a fault can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultOp {
    /// Blob listing.
    List,
    /// Blob write.
    Upload,
    /// Blob read.
    Download,
    /// Blob removal.
    Remove,
    /// Blob move.
    Move,
    /// Document read.
    Get,
    /// Document write.
    Set,
    /// Document delete.
    Delete,
    /// Document query.
    Query,
    /// Batched document commit.
    Commit,
}

impl FaultOp {
    fn error_kind(self) -> ErrorKind {
        match self {
            Self::List | Self::Upload | Self::Download | Self::Remove | Self::Move => {
                ErrorKind::Storage
            }
            Self::Get | Self::Set | Self::Delete | Self::Query | Self::Commit => {
                ErrorKind::Metadata
            }
        }
    }
}

/// Records every call and fails the ones matching a registered rule.
///
/// A rule is an operation plus a key prefix; an empty prefix matches every
/// key. For metadata operations the key is `{collection}/{doc path}`, with the
/// document id decoded back to its path when possible.
#[derive(Debug, Default)]
pub struct FaultInjector {
    rules: DashMap<FaultOp, Vec<String>>,
    calls: DashMap<FaultOp, usize>,
}

impl FaultInjector {
    /// Fail every `op` call whose key starts with `prefix`.
    pub fn fail_on(&self, op: FaultOp, prefix: impl Into<String>) {
        self.rules.entry(op).or_default().push(prefix.into());
    }

    /// Remove every rule.
    pub fn clear(&self) {
        self.rules.clear();
    }

    /// Number of `op` calls seen so far.
    pub fn calls(&self, op: FaultOp) -> usize {
        self.calls.get(&op).map(|c| *c).unwrap_or(0)
    }

    /// Total calls across all operations.
    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }

    /// Record a call and fail it if a rule matches.
    pub fn check(&self, op: FaultOp, key: &str) -> AppResult<()> {
        *self.calls.entry(op).or_insert(0) += 1;
        let hit = self
            .rules
            .get(&op)
            .is_some_and(|prefixes| prefixes.iter().any(|p| key.starts_with(p.as_str())));
        if hit {
            return Err(AppError::new(
                op.error_kind(),
                format!("Injected {op:?} failure for '{key}'"),
            ));
        }
        Ok(())
    }
}
