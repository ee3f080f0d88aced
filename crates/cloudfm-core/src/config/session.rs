//! Session configuration.

use serde::{Deserialize, Serialize};

/// Identity settings for local (non-authenticated) use.
///
/// The identity provider normally supplies the owner id per session; the
/// command-line front end falls back to this value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Owner id used as the root prefix of every path.
    #[serde(default = "default_owner")]
    pub default_owner: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_owner: default_owner(),
        }
    }
}

fn default_owner() -> String {
    "local".to_string()
}
