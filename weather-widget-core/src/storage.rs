//! Session-scoped key/value storage and the snapshot slot kept in it.

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fmt::Debug,
    fs,
    path::PathBuf,
    sync::Arc,
};
use thiserror::Error;
use tracing::debug;

use crate::model::{Coordinates, WeatherSnapshot};

/// Slot holding the serialized [`WeatherSnapshot`].
pub const STORAGE_KEY: &str = "workoutWeatherSnapshot";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Session storage is not available")]
    Unavailable,

    #[error("Session storage quota exceeded ({needed} bytes, limit {limit})")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session storage encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Text key/value store living as long as the user's session.
pub trait SessionStorage: Send + Sync + Debug {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process storage, optionally capped to mimic a browser quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects any value longer than `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self { items: Mutex::default(), quota: Some(bytes) }
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.quota {
            if value.len() > limit {
                return Err(StorageError::QuotaExceeded { needed: value.len(), limit });
            }
        }
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// All keys in one JSON object file. A missing file is an empty session.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    fn load_items(&self) -> Result<HashMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }
}

impl SessionStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock();
        Ok(self.load_items()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock();

        let mut items = self.load_items()?;
        items.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(&items)?)?;
        Ok(())
    }
}

/// Reads and writes the single snapshot slot.
///
/// `storage` is `None` when the host offers no session storage at all.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    storage: Option<Arc<dyn SessionStorage>>,
}

impl SnapshotStore {
    pub fn new(storage: Option<Arc<dyn SessionStorage>>) -> Self {
        Self { storage }
    }

    /// The stored snapshot. Any failure reads as "nothing stored".
    pub fn read(&self) -> Option<WeatherSnapshot> {
        let storage = self.storage.as_ref()?;

        let raw = match storage.get_item(STORAGE_KEY) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(e) => {
                debug!("Session storage read failed: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!("Ignoring unparseable stored snapshot: {e}");
                None
            }
        }
    }

    pub fn write(&self, snapshot: &WeatherSnapshot) -> Result<(), StorageError> {
        let storage = self.storage.as_ref().ok_or(StorageError::Unavailable)?;
        let raw = serde_json::to_string(snapshot)?;
        storage.set_item(STORAGE_KEY, &raw)
    }

    /// Coordinates of the stored snapshot, when both are present and finite.
    pub fn stored_coordinates(&self) -> Option<Coordinates> {
        self.read()?.coordinates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            summary: "19C - 63% HR - Soleado".into(),
            temperature: Some(18.6),
            humidity: Some(63.0),
            condition: Some("Soleado".into()),
            updated_at: Some("2026-01-06T09:30:00.000Z".into()),
            latitude: Some(40.4168),
            longitude: Some(-3.7038),
            note: "ultima ubicacion".into(),
            ..Default::default()
        }
    }

    fn memory_store() -> (Arc<MemoryStorage>, SnapshotStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SnapshotStore::new(Some(storage.clone()));
        (storage, store)
    }

    #[test]
    fn write_then_read_returns_same_snapshot() {
        let (_, store) = memory_store();
        let snap = snapshot();

        store.write(&snap).expect("write should succeed");

        assert_eq!(store.read(), Some(snap));
    }

    #[test]
    fn read_without_storage_is_absent() {
        let store = SnapshotStore::new(None);
        assert!(store.read().is_none());
    }

    #[test]
    fn write_without_storage_reports_unavailable() {
        let store = SnapshotStore::new(None);
        let err = store.write(&snapshot()).unwrap_err();

        assert!(matches!(err, StorageError::Unavailable));
    }

    #[test]
    fn read_unset_or_empty_key_is_absent() {
        let (storage, store) = memory_store();
        assert!(store.read().is_none());

        storage.set_item(STORAGE_KEY, "").unwrap();
        assert!(store.read().is_none());
    }

    #[test]
    fn read_garbage_is_absent() {
        let (storage, store) = memory_store();
        storage.set_item(STORAGE_KEY, "{not json").unwrap();

        assert!(store.read().is_none());
    }

    #[test]
    fn quota_failure_is_reported() {
        let store = SnapshotStore::new(Some(Arc::new(MemoryStorage::with_quota(8))));
        let err = store.write(&snapshot()).unwrap_err();

        assert!(matches!(err, StorageError::QuotaExceeded { limit: 8, .. }));
        assert!(store.read().is_none());
    }

    #[test]
    fn stored_coordinates_need_finite_values() {
        let (storage, store) = memory_store();
        assert_eq!(store.stored_coordinates(), None);

        store.write(&snapshot()).unwrap();
        assert_eq!(store.stored_coordinates(), Some(Coordinates::new(40.4168, -3.7038)));

        storage.set_item(STORAGE_KEY, r#"{"summary":"x","latitude":"north","longitude":2}"#).unwrap();
        assert_eq!(store.stored_coordinates(), None);
    }

    #[test]
    fn null_note_keeps_snapshot_readable() {
        let (storage, store) = memory_store();
        storage
            .set_item(
                STORAGE_KEY,
                r#"{"summary":"21C - Nublado","latitude":40.4,"longitude":-3.7,"note":null}"#,
            )
            .unwrap();

        let snap = store.read().expect("snapshot with null note is readable");
        assert_eq!(snap.summary, "21C - Nublado");
        assert_eq!(snap.note, "");
        assert_eq!(store.stored_coordinates(), Some(Coordinates::new(40.4, -3.7)));
    }

    #[test]
    fn string_coordinates_are_recovered() {
        let (storage, store) = memory_store();
        storage
            .set_item(
                STORAGE_KEY,
                r#"{"summary":"x","temperature":"21.4","latitude":"40.4","longitude":-3.7}"#,
            )
            .unwrap();

        assert_eq!(store.read().and_then(|s| s.temperature), Some(21.4));
        assert_eq!(store.stored_coordinates(), Some(Coordinates::new(40.4, -3.7)));
    }

    #[test]
    fn file_storage_persists_between_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session").join("session.json");

        let first = SnapshotStore::new(Some(Arc::new(FileStorage::new(&path))));
        first.write(&snapshot()).expect("write");

        let second = SnapshotStore::new(Some(Arc::new(FileStorage::new(&path))));
        assert_eq!(second.read(), Some(snapshot()));
    }

    #[test]
    fn file_storage_keeps_other_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::new(dir.path().join("session.json"));

        storage.set_item("other", "value").unwrap();
        storage.set_item(STORAGE_KEY, "{}").unwrap();

        assert_eq!(storage.get_item("other").unwrap().as_deref(), Some("value"));
        assert_eq!(storage.get_item(STORAGE_KEY).unwrap().as_deref(), Some("{}"));
        assert_eq!(storage.get_item("missing").unwrap(), None);
    }

    #[test]
    fn corrupt_session_file_reads_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        fs::write(&path, "[1, 2").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(storage.get_item(STORAGE_KEY), Err(StorageError::Encoding(_))));

        let store = SnapshotStore::new(Some(Arc::new(storage)));
        assert!(store.read().is_none());
    }
}
