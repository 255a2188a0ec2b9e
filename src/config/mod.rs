use serde::{Deserialize, Serialize};

use crate::core::DirectoryDigester;

pub const DEFAULT_EXCLUDE_PATTERNS: &str = "__pycache__, .git, .venv";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Comma-separated regular expressions matched against entry names.
    pub exclude_patterns: String,
    /// Files above this size are listed in the digest without content.
    pub max_file_size_mb: u64,
    /// Adds a token estimate to the digest summary.
    pub estimate_tokens: bool,
}

impl AppConfig {
    /// The built-in digest generator configured from these settings.
    pub fn digester(&self) -> DirectoryDigester {
        DirectoryDigester {
            max_file_size: self.max_file_size_mb.saturating_mul(1024 * 1024),
            estimate_tokens: self.estimate_tokens,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS.to_string(),
            max_file_size_mb: 20,
            estimate_tokens: true,
        }
    }
}
