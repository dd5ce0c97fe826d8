//! Save directory: `Save`, `Load` and the recent-saves listing.

use crate::format::SAVE_EXTENSION;
use crate::{StorageError, StorageResult, StoreConfig, decode_graph, encode_graph};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use theta_model::TypeCatalog;
use theta_registry::{HandleRegistry, RegistryStats};
use tracing::{debug, info, warn};

/// Identifier of a save file: its name without the `.ths` extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveId(String);

impl SaveId {
    /// Accepts `name` or `name.ths`. Rejects anything that could leave the
    /// data directory.
    pub fn parse(id: &str) -> StorageResult<Self> {
        let stem = id
            .strip_suffix(SAVE_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or(id);
        if stem.is_empty()
            || stem.contains(['/', '\\'])
            || stem.contains("..")
            || stem.starts_with('.')
        {
            return Err(StorageError::format(format!("invalid save identifier {id:?}")));
        }
        Ok(Self(stem.to_string()))
    }

    /// The identifier for a save taken at `at`: its unix timestamp in seconds.
    #[must_use]
    pub fn from_time(at: DateTime<Utc>) -> Self {
        Self(at.timestamp().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{SAVE_EXTENSION}", self.0)
    }

    /// When the save was taken, if the identifier is a timestamp.
    #[must_use]
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        let secs: i64 = self.0.parse().ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

impl fmt::Display for SaveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SaveId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One entry of the recent-saves listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveSummary {
    pub id: SaveId,
    pub saved_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Saves and loads a registry to files in one data directory.
///
/// Both operations hold the registry's exclusive lock from the first read
/// of the table to the last write, so they never interleave with assigns,
/// frees or each other.
#[derive(Debug, Clone)]
pub struct SaveStore {
    config: StoreConfig,
    catalog: Arc<TypeCatalog>,
    registry: HandleRegistry,
}

impl SaveStore {
    /// Opens the store, creating the data directory if needed.
    pub fn open(
        config: StoreConfig,
        catalog: Arc<TypeCatalog>,
        registry: HandleRegistry,
    ) -> StorageResult<Self> {
        fs::create_dir_all(&config.data_dir)?;
        debug!("Save directory: {}", config.data_dir.display());
        Ok(Self {
            config,
            catalog,
            registry,
        })
    }

    #[must_use]
    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    #[must_use]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Full path of the file for `id`.
    #[must_use]
    pub fn path_of(&self, id: &SaveId) -> PathBuf {
        self.config.data_dir.join(id.file_name())
    }

    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Writes the registry to a new file named after the current time.
    /// A save within the same second as an earlier one replaces it.
    pub fn save(&self) -> StorageResult<SaveId> {
        let id = SaveId::from_time(Utc::now());
        self.save_as(&id)?;
        Ok(id)
    }

    /// Writes the registry to the file for `id`.
    pub fn save_as(&self, id: &SaveId) -> StorageResult<()> {
        let path = self.path_of(id);
        let tmp = path.with_extension(format!("{SAVE_EXTENSION}.tmp"));

        let guard = self.registry.lock();
        let snapshot = guard.snapshot();
        let bytes = encode_graph(&snapshot, &self.catalog)?;
        if let Err(e) = fs::write(&tmp, &bytes).and_then(|()| fs::rename(&tmp, &path)) {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!("Failed to remove {}: {}", tmp.display(), cleanup);
                }
            }
            return Err(e.into());
        }
        drop(guard);

        info!(
            "Saved {} ({} entities, {} freed, {} bytes)",
            id,
            snapshot.entities.len(),
            snapshot.freed.len(),
            bytes.len()
        );
        Ok(())
    }

    /// Replaces the registry's contents with the save `id` (with or
    /// without the `.ths` extension).
    ///
    /// The file is fully decoded and every entity rebuilt before the
    /// registry changes; on any error the registry is left as it was.
    pub fn load(&self, id: impl AsRef<str>) -> StorageResult<RegistryStats> {
        let id = SaveId::parse(id.as_ref())?;
        let path = self.path_of(&id);

        let mut guard = self.registry.lock();
        let file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::format(format!("save {id} not found")),
            _ => StorageError::Io(e),
        })?;
        let snapshot = decode_graph(BufReader::new(file), &self.catalog)?;
        guard.restore(snapshot, &self.catalog)?;
        let stats = guard.stats();
        drop(guard);

        info!(
            "Loaded {} ({} entities, {} freed, next {})",
            id, stats.held, stats.freed, stats.next
        );
        Ok(stats)
    }

    /// Saves in the data directory, most recent first, at most `limit`.
    /// Files whose name is not a timestamp are skipped.
    pub fn list_recent(&self, limit: usize) -> StorageResult<Vec<SaveSummary>> {
        let mut saves = Vec::new();
        for entry in fs::read_dir(&self.config.data_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let id = SaveId(stem.to_string());
            let Some(saved_at) = id.saved_at() else {
                continue;
            };
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            saves.push(SaveSummary {
                id,
                saved_at,
                size_bytes: metadata.len(),
            });
        }
        saves.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        saves.truncate(limit);
        Ok(saves)
    }

    /// [`Self::list_recent`] with the configured limit.
    pub fn recent(&self) -> StorageResult<Vec<SaveSummary>> {
        self.list_recent(self.config.recent_limit)
    }

    /// [`Self::save`] on the blocking thread pool.
    pub async fn save_async(&self) -> StorageResult<SaveId> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.save())
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }

    /// [`Self::load`] on the blocking thread pool.
    pub async fn load_async(&self, id: impl Into<String>) -> StorageResult<RegistryStats> {
        let store = self.clone();
        let id = id.into();
        tokio::task::spawn_blocking(move || store.load(id))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }
}
