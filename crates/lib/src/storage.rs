//! Durable client-side token storage.
//!
//! The session layer persists two strings between application runs: the
//! access token and the refresh token, stored under fixed well-known keys.
//! Absence of either key means "anonymous". [`TokenStore`] abstracts the
//! storage so the session manager and the HTTP wrapper share one seam:
//! [`MemoryTokenStore`] for tests and ephemeral sessions,
//! [`FileTokenStore`] for a JSON file on disk.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::Result;

/// Well-known storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "authToken";

/// Well-known storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Errors from the token storage layer.
///
/// Payloads are plain strings so the error (like every error in this crate)
/// stays `Clone` and can be fanned out to multiple waiters.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error at {path}: {message}")]
    Io { path: String, message: String },

    /// The backing file exists but does not contain a valid token map.
    #[error("corrupt token store at {path}: {message}")]
    Corrupt { path: String, message: String },
}

/// Durable key/value storage for session tokens.
///
/// Implementations must be safe to share between the session manager and the
/// HTTP wrapper, which may touch the store from concurrent tasks.
pub trait TokenStore: Send + Sync + Debug {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory token store.
///
/// Holds tokens only for the lifetime of the process. Tests construct a fresh
/// one per case to get isolation.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// File-backed token store.
///
/// Persists the token map as pretty-printed JSON. The file is read once when
/// the store is opened; a missing file is treated as an empty store. Every
/// mutation writes the map back through to disk.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileTokenStore {
    /// Open the store at `path`, loading any previously persisted tokens.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).map_err(|e| StorageError::Corrupt {
                path: path.display().to_string(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
                .into());
            }
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries).map_err(|e| StorageError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, json).map_err(|e| {
            StorageError::Io {
                path: self.path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }
}
