//! Persisted local state behind a single storage gateway.
//!
//! Every model that survives an app restart (session, cart, draft order,
//! recent orders) reads its snapshot once at startup and writes it back
//! synchronously after each mutation. The gateway only moves opaque blobs;
//! JSON encoding lives in [`load_json`] and [`save_json`].

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Storage keys for persisted snapshots.
pub mod keys {
    /// Key for the session snapshot (token, role, account).
    pub const SESSION: &str = "session";

    /// Key for the cart lines.
    pub const CART: &str = "cart";

    /// Key for the uncommitted draft order.
    pub const DRAFT_ORDER: &str = "draft_order";

    /// Key for the recent-orders cache.
    pub const RECENT_ORDERS: &str = "recent_orders";
}

/// Errors that can occur when reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("storage I/O error for key {key}: {source}")]
    Io {
        /// Storage key being accessed.
        key: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A stored snapshot could not be decoded.
    #[error("corrupt snapshot for key {key}: {source}")]
    Corrupt {
        /// Storage key being decoded.
        key: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// The key cannot be mapped onto the backing store.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Key/blob store for persisted client state.
///
/// Implementations must be cheap to call synchronously from the UI thread.
pub trait StorageGateway: Send + Sync {
    /// Load the blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `blob` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError>;

    /// Delete the blob stored under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Decode the JSON snapshot stored under `key`.
///
/// # Errors
///
/// Returns `StorageError::Corrupt` if the blob is not valid JSON for `T`,
/// or the gateway's own error if loading fails.
pub fn load_json<T: DeserializeOwned>(
    storage: &dyn StorageGateway,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(blob) = storage.load(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&blob)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })
}

/// Encode `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns an error if encoding or the underlying save fails.
pub fn save_json<T: Serialize + ?Sized>(
    storage: &dyn StorageGateway,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let blob = serde_json::to_string(value).map_err(StorageError::Encode)?;
    storage.save(key, &blob)
}

/// Load a snapshot for startup, falling back to `T::default()` when the
/// stored blob is unreadable.
///
/// A corrupt snapshot is logged and discarded rather than blocking startup.
///
/// # Errors
///
/// Returns an error only if the gateway itself fails.
pub fn restore_or_default<T: DeserializeOwned + Default>(
    storage: &dyn StorageGateway,
    key: &str,
) -> Result<T, StorageError> {
    match load_json(storage, key) {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(err @ StorageError::Corrupt { .. }) => {
            tracing::warn!(key, error = %err, "Discarding unreadable snapshot");
            Ok(T::default())
        }
        Err(err) => Err(err),
    }
}

// =============================================================================
// In-memory gateway
// =============================================================================

/// Volatile storage, used by tests and by hosts that manage persistence
/// themselves.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a blob is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Raw blob stored under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl StorageGateway for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// =============================================================================
// File-backed gateway
// =============================================================================

/// One JSON file per key inside a state directory.
///
/// Writes go to a temporary sibling file which is then renamed over the
/// target, so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a state directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// The state directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StorageGateway for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        fs::write(&tmp, blob).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}
