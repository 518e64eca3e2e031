//! Storage adapters for the task store
//!
//! The store persists the whole [`AppData`] blob through the
//! [`StorageAdapter`] contract; each platform shell supplies its own
//! implementation (IPC bridge on desktop, key-value storage on mobile).
//! Two reference adapters live here:
//!
//! - [`MemoryStorage`] keeps the blob in process, for tests and the web
//!   shell's session fallback
//! - [`FileStorage`] persists a single JSON file with atomic writes
//!
//! Adapters return a structurally valid default when nothing has been
//! persisted yet; an unreadable blob surfaces as [`Error::CorruptData`]
//! so it is never mistaken for a fresh install.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use fs2::FileExt;

use crate::error::{Error, Result};
use crate::model::AppData;

/// Async get/set of the entire application data blob
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Load the persisted blob, or a default when none exists yet
    async fn get_data(&self) -> Result<AppData>;

    /// Persist the full blob, replacing whatever was stored before
    async fn save_data(&self, data: &AppData) -> Result<()>;
}

/// In-process adapter holding the blob behind a mutex
#[derive(Default)]
pub struct MemoryStorage {
    data: Mutex<Option<AppData>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the adapter with an existing blob
    pub fn with_data(data: AppData) -> Self {
        Self {
            data: Mutex::new(Some(data)),
        }
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn get_data(&self) -> Result<AppData> {
        let guard = self
            .data
            .lock()
            .map_err(|_| Error::Storage("memory storage poisoned".to_string()))?;
        Ok(guard.clone().unwrap_or_default())
    }

    async fn save_data(&self, data: &AppData) -> Result<()> {
        let mut guard = self
            .data
            .lock()
            .map_err(|_| Error::Storage("memory storage poisoned".to_string()))?;
        *guard = Some(data.clone());
        Ok(())
    }
}

/// File-backed adapter persisting one JSON document
///
/// Writes go to a temp file in the same directory followed by an atomic
/// rename, so readers never observe a partial blob. A sibling `.lock`
/// file guards against two processes writing at once.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn write_atomic(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Fail fast on contention rather than parking a runtime worker
        // on a blocking flock
        let lock_file = File::create(self.lock_path())?;
        match lock_file.try_lock_exclusive() {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                return Err(Error::LockFailed(self.lock_path()));
            }
            Err(err) => return Err(Error::Io(err)),
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        // Lock released when lock_file drops
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for FileStorage {
    async fn get_data(&self) -> Result<AppData> {
        if !self.path.exists() {
            return Ok(AppData::default());
        }
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|err| Error::CorruptData {
            path: self.path.clone(),
            reason: err.to_string(),
        })
    }

    async fn save_data(&self, data: &AppData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        self.write_atomic(json.as_bytes())
    }
}
