//! Durable session storage.
//!
//! Only the `{cart, user}` projection of the store's state is durable;
//! catalog caches and the loading flag are rebuilt each session. The
//! projection is written through on every mutation of a persisted field and
//! read exactly once, at store construction, before any UI consumer sees
//! the store.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CartLine, User};

/// Envelope version written by this build.
///
/// Bumped when the persisted shape changes incompatibly; an envelope with an
/// unknown version fails to load rather than being misread.
pub const STORAGE_VERSION: u32 = 1;

/// The durable projection of store state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// Cart contents.
    #[serde(default)]
    pub cart: Vec<CartLine>,
    /// Authenticated principal, if signed in.
    #[serde(default)]
    pub user: Option<User>,
}

/// On-disk envelope wrapping the persisted projection.
#[derive(Debug, Serialize, Deserialize)]
struct StorageEnvelope {
    version: u32,
    state: PersistedSession,
}

/// Errors from the storage layer.
///
/// The store logs these and continues; a broken storage never takes the
/// session down.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored blob could not be (de)serialized.
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Envelope was written by an incompatible build.
    #[error("unsupported storage version {0}")]
    UnsupportedVersion(u32),
}

/// Durable key-value persistence for the session projection.
pub trait SessionStorage {
    /// Read the persisted session, if one exists.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the blob exists but cannot be read or
    /// decoded.
    fn load(&self) -> Result<Option<PersistedSession>, StorageError>;

    /// Write the session projection, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the blob cannot be written.
    fn save(&self, session: &PersistedSession) -> Result<(), StorageError>;
}

// =============================================================================
// JsonFileStorage
// =============================================================================

/// File-backed JSON storage.
///
/// Saves write to a sibling temp file and rename into place, so a crash
/// mid-write leaves the previous session intact.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Create storage backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path this storage writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<PersistedSession>, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let envelope: StorageEnvelope = serde_json::from_str(&contents)?;
        if envelope.version != STORAGE_VERSION {
            return Err(StorageError::UnsupportedVersion(envelope.version));
        }

        Ok(Some(envelope.state))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        let envelope = StorageEnvelope {
            version: STORAGE_VERSION,
            state: session.clone(),
        };
        let blob = serde_json::to_vec(&envelope)?;

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(&blob)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}

// =============================================================================
// InMemoryStorage
// =============================================================================

/// In-memory storage sharing its contents across clones.
///
/// Used by tests to simulate a restart: hand one clone to a store, drop the
/// store, and restore a new one from another clone.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    cell: Arc<Mutex<Option<PersistedSession>>>,
}

impl InMemoryStorage {
    /// Create empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the currently stored session, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<PersistedSession> {
        self.cell.lock().map_or(None, |guard| guard.clone())
    }
}

impl SessionStorage for InMemoryStorage {
    fn load(&self) -> Result<Option<PersistedSession>, StorageError> {
        Ok(self.snapshot())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), StorageError> {
        if let Ok(mut guard) = self.cell.lock() {
            *guard = Some(session.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jersey_shop_core::ProductId;
    use rust_decimal::dec;

    fn sample_session() -> PersistedSession {
        PersistedSession {
            cart: vec![CartLine {
                id: ProductId::new(1),
                name: "Home Jersey".to_string(),
                price: dec!(49.99),
                image: "/images/home.jpg".to_string(),
                category: "jerseys".to_string(),
                size: Some("M".to_string()),
                quantity: 2,
            }],
            user: None,
        }
    }

    fn temp_storage() -> JsonFileStorage {
        let path = std::env::temp_dir().join(format!("jersey-shop-test-{}.json", uuid::Uuid::new_v4()));
        JsonFileStorage::new(path)
    }

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let storage = temp_storage();
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let storage = temp_storage();
        let session = sample_session();

        storage.save(&session).unwrap();
        assert_eq!(storage.load().unwrap(), Some(session));

        std::fs::remove_file(storage.path()).unwrap();
    }

    #[test]
    fn test_file_storage_overwrites() {
        let storage = temp_storage();
        storage.save(&sample_session()).unwrap();
        storage.save(&PersistedSession::default()).unwrap();

        assert_eq!(storage.load().unwrap(), Some(PersistedSession::default()));

        std::fs::remove_file(storage.path()).unwrap();
    }

    #[test]
    fn test_file_storage_rejects_corrupt_blob() {
        let storage = temp_storage();
        std::fs::write(storage.path(), "not json at all").unwrap();

        assert!(matches!(storage.load(), Err(StorageError::Serde(_))));

        std::fs::remove_file(storage.path()).unwrap();
    }

    #[test]
    fn test_file_storage_rejects_unknown_version() {
        let storage = temp_storage();
        std::fs::write(storage.path(), r#"{"version": 99, "state": {}}"#).unwrap();

        assert!(matches!(
            storage.load(),
            Err(StorageError::UnsupportedVersion(99))
        ));

        std::fs::remove_file(storage.path()).unwrap();
    }

    #[test]
    fn test_in_memory_storage_shares_across_clones() {
        let storage = InMemoryStorage::new();
        let clone = storage.clone();

        storage.save(&sample_session()).unwrap();
        assert_eq!(clone.load().unwrap(), Some(sample_session()));
    }
}
