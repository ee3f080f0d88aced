//! Upload admission configuration.

use serde::{Deserialize, Serialize};

/// Extension allow-list and size ceilings applied before any upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Allowed extensions, lowercase with a leading dot.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Extensions subject to the image size ceiling.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    /// Maximum size of an image upload in bytes (default 1 MiB).
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            image_extensions: default_image_extensions(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

fn default_allowed_extensions() -> Vec<String> {
    [
        ".html", ".htm", ".css", ".scss", ".sass", ".less", ".js", ".jsx", ".ts", ".tsx",
        ".json", ".json5", ".xml", ".yaml", ".yml", ".vue", ".py", ".rb", ".php", ".java",
        ".c", ".cpp", ".cs", ".go", ".rs", ".kt", ".kts", ".dart", ".swift", ".m", ".mm",
        ".sh", ".bash", ".ps1", ".pl", ".r", ".jl", ".sql", ".sqlite", ".db", ".mdb",
        ".accdb", ".md", ".markdown", ".toml", ".ini", ".cfg", ".config", ".env",
        ".dockerfile", ".gitignore", ".gitattributes", ".editorconfig", ".yarnrc", ".npmrc",
        ".babelrc", ".txt", ".rtf", ".odt", ".gradle", ".makefile", ".mk", ".bat", ".cmd",
        ".lock", ".log", ".ipynb", ".csv", ".tsv", ".jsonc", ".asm", ".s", ".inc", ".pdf",
        ".png", ".jpeg", ".svg", ".jpg",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_image_extensions() -> Vec<String> {
    vec![".png".to_string(), ".jpeg".to_string(), ".jpg".to_string()]
}

fn default_max_image_bytes() -> u64 {
    1_048_576 // 1 MiB
}
