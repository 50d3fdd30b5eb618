//! Upload storage configuration.

use serde::{Deserialize, Serialize};

/// Local upload directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for uploaded files.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Older upload roots searched when a file is not found under
    /// `upload_dir`.
    #[serde(default)]
    pub legacy_dirs: Vec<String>,
    /// Maximum size of a single uploaded file in bytes.
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Accepted file extensions (lowercase, without dot).
    #[serde(default = "default_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            legacy_dirs: Vec::new(),
            max_upload_size_bytes: default_max_upload(),
            allowed_extensions: default_extensions(),
        }
    }
}

fn default_upload_dir() -> String {
    "./data/uploads".to_string()
}

fn default_max_upload() -> u64 {
    5 * 1024 * 1024
}

fn default_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp", "pdf"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
