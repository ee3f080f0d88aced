//! Storage backend configuration.

use serde::{Deserialize, Serialize};

/// Blob and metadata backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all local runtime data.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// Backend kind: `"local"` (filesystem + JSON file) or `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Bucket holding live files.
    #[serde(default = "default_files_bucket")]
    pub files_bucket: String,
    /// Bucket holding recycled (deleted) files.
    #[serde(default = "default_recycle_bucket")]
    pub recycle_bucket: String,
    /// Prefix inside the files bucket where public copies live.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Base URL used to build public object URLs.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// File (under `data_root`) holding the metadata collections.
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            provider: default_provider(),
            files_bucket: default_files_bucket(),
            recycle_bucket: default_recycle_bucket(),
            public_prefix: default_public_prefix(),
            public_base_url: default_public_base_url(),
            metadata_file: default_metadata_file(),
        }
    }
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_files_bucket() -> String {
    "files".to_string()
}

fn default_recycle_bucket() -> String {
    "recycle".to_string()
}

fn default_public_prefix() -> String {
    "public".to_string()
}

fn default_public_base_url() -> String {
    "file://./data".to_string()
}

fn default_metadata_file() -> String {
    "metadata.json".to_string()
}
