use crate::StorageResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Overrides the default data directory when set.
pub const DATA_DIR_ENV: &str = "THETA_DATA_DIR";

/// How many saves [`SaveStore::recent`](crate::SaveStore::recent) lists.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Where saves live and how they are listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub recent_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    #[must_use]
    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    /// Reads a JSON config. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> StorageResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// `$THETA_DATA_DIR`, else the platform data directory joined with `Theta`.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Theta")
}
