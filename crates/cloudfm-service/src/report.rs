//! Human-readable outcomes of mutations and uploads.

use serde::{Deserialize, Serialize};

use cloudfm_core::types::Progress;

use crate::upload::AdmissionReport;

/// Outcome of a successful (or best-effort) mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReport {
    /// One-line description, e.g. `Folder "a" renamed to "b".`
    pub summary: String,
    /// Items finished successfully.
    pub completed: usize,
    /// Items that failed without aborting the operation.
    pub failed: usize,
    /// Items the operation set out to process.
    pub total: usize,
}

impl OperationReport {
    /// A report where every item succeeded.
    pub fn complete(summary: impl Into<String>, total: usize) -> Self {
        Self {
            summary: summary.into(),
            completed: total,
            failed: 0,
            total,
        }
    }

    /// A report for an operation that had nothing to do.
    pub fn unchanged(summary: impl Into<String>) -> Self {
        Self::complete(summary, 0)
    }

    /// Final progress snapshot.
    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.completed + self.failed,
            total: self.total,
        }
    }

    /// Message to show the user.
    pub fn message(&self) -> String {
        if self.failed > 0 {
            format!(
                "{} ({} of {} completed, {} failed)",
                self.summary, self.completed, self.total, self.failed
            )
        } else {
            self.summary.clone()
        }
    }
}

/// Outcome of an upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReport {
    /// What the admission filter let through and skipped.
    pub admission: AdmissionReport,
    /// Files written (blob and document).
    pub uploaded: usize,
    /// Admitted files that failed to upload.
    pub failed: usize,
    /// Folders created while uploading a tree.
    pub folders_created: usize,
}

impl UploadReport {
    /// Admitted files the batch tried to upload.
    pub fn total(&self) -> usize {
        self.uploaded + self.failed
    }

    /// Message to show the user: skipped counts first, then the outcome.
    pub fn message(&self) -> String {
        let outcome = if self.failed == 0 {
            "Upload complete!".to_string()
        } else {
            format!("Uploaded {} of {} files.", self.uploaded, self.total())
        };
        match self.admission.summary() {
            Some(skipped) => format!("{skipped} {outcome}"),
            None => outcome,
        }
    }
}
