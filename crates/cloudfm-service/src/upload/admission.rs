//! Upload admission filter.
//!
//! Decides, from a file's name and size alone, whether it may be uploaded.
//! Names without a `.` are always admitted. Otherwise the extension (from
//! the last `.`, case-insensitive) must be on the allow-list, and image
//! extensions are additionally capped in size.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use cloudfm_core::config::UploadConfig;
use cloudfm_core::path;

use super::service::UploadNode;

/// Verdict for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Admission {
    /// May be uploaded.
    Accepted,
    /// An image over the size ceiling.
    OversizedImage,
    /// Extension not on the allow-list.
    InvalidType,
}

/// Counts from screening a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionReport {
    /// Files admitted.
    pub admitted: usize,
    /// Images skipped for size.
    pub oversized_images: usize,
    /// Files skipped for type.
    pub invalid_types: usize,
}

impl AdmissionReport {
    /// Fold one verdict into the counts.
    pub fn record(&mut self, admission: Admission) {
        match admission {
            Admission::Accepted => self.admitted += 1,
            Admission::OversizedImage => self.oversized_images += 1,
            Admission::InvalidType => self.invalid_types += 1,
        }
    }

    /// Skip message, or `None` when nothing was skipped.
    pub fn summary(&self) -> Option<String> {
        let mut message = String::new();
        if self.oversized_images > 0 {
            message.push_str(&format!(
                "{} image(s) skipped (> 1MB). ",
                self.oversized_images
            ));
        }
        if self.invalid_types > 0 {
            message.push_str(&format!(
                "{} file(s) skipped (invalid type). ",
                self.invalid_types
            ));
        }
        let message = message.trim_end();
        (!message.is_empty()).then(|| message.to_string())
    }
}

/// Extension allow-list and image size ceiling.
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    allowed: HashSet<String>,
    images: HashSet<String>,
    max_image_bytes: u64,
}

impl AdmissionFilter {
    /// Build from configuration. Extensions are normalised to lowercase
    /// with a leading dot.
    pub fn from_config(config: &UploadConfig) -> Self {
        fn normalise(ext: &String) -> String {
            let ext = ext.trim().to_ascii_lowercase();
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{ext}")
            }
        }
        Self {
            allowed: config.allowed_extensions.iter().map(normalise).collect(),
            images: config.image_extensions.iter().map(normalise).collect(),
            max_image_bytes: config.max_image_bytes,
        }
    }

    /// Judge one candidate.
    pub fn admit(&self, name: &str, size_bytes: u64) -> Admission {
        let Some(ext) = path::extension_of(name) else {
            return Admission::Accepted;
        };
        if !self.allowed.contains(&ext) {
            return Admission::InvalidType;
        }
        if self.images.contains(&ext) && size_bytes > self.max_image_bytes {
            return Admission::OversizedImage;
        }
        Admission::Accepted
    }

    /// Screen a flat batch: the admitted items plus the counts.
    pub fn screen<'a, T, F>(&self, items: &'a [T], describe: F) -> (Vec<&'a T>, AdmissionReport)
    where
        F: Fn(&T) -> (&str, u64),
    {
        let mut report = AdmissionReport::default();
        let admitted = items
            .iter()
            .filter(|item| {
                let (name, size) = describe(item);
                let verdict = self.admit(name, size);
                report.record(verdict);
                verdict == Admission::Accepted
            })
            .collect();
        (admitted, report)
    }
}

/// Screen every file in a set of trees without touching any backend.
pub fn count_tree(filter: &AdmissionFilter, nodes: &[UploadNode]) -> AdmissionReport {
    fn visit(filter: &AdmissionFilter, node: &UploadNode, report: &mut AdmissionReport) {
        match node {
            UploadNode::File(file) => report.record(filter.admit(&file.name, file.size())),
            UploadNode::Directory { children, .. } => {
                for child in children {
                    visit(filter, child, report);
                }
            }
        }
    }
    let mut report = AdmissionReport::default();
    for node in nodes {
        visit(filter, node, &mut report);
    }
    report
}
