//! Public share document.

use serde::{Deserialize, Serialize};

use crate::document::MetadataDocument;

/// A document in the `publicFiles` collection: one file published under the
/// public prefix until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicShare {
    /// File name.
    pub name: String,
    /// When the share was created, milliseconds since epoch.
    pub created_at: i64,
    /// When the share stops being valid, milliseconds since epoch.
    pub expires_at: i64,
    /// Key of the public copy, `public/{fullPath}`.
    pub path: String,
    /// Owner id.
    pub usr: String,
    /// Storage key of the shared file.
    pub full_path: String,
}

impl PublicShare {
    /// Whether the share has lapsed at `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

impl MetadataDocument for PublicShare {
    const COLLECTION: &'static str = "publicFiles";

    fn key_path(&self) -> &str {
        &self.full_path
    }
}

/// Outcome of a star toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StarState {
    /// Newly published until `expires_at`.
    Starred {
        /// Expiry, milliseconds since epoch.
        expires_at: i64,
    },
    /// Share removed.
    Unstarred,
}
