//! Named JSON blobs on disk (or in memory for tests).
//!
//! Each key maps to one JSON document. The church-data blob holds every
//! record array; feature code reads it, replaces its own section and
//! writes it back so sections it does not own survive untouched.

use crate::error::{AccordError, Result};
use crate::schema::ChurchData;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const CHURCH_DATA_KEY: &str = "accordChurchData";
pub const SETTINGS_KEY: &str = "accordChurchSettings";

/// Raw key/value persistence under a [`Store`].
pub trait Backend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, contents: &str) -> Result<()>;
    /// Returns whether the key existed.
    fn remove(&self, key: &str) -> Result<bool>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug)]
pub struct FsBackend {
    dir: PathBuf,
}

impl FsBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FsBackend { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Backend for FsBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, contents: &str) -> Result<()> {
        // Write next to the target then rename so readers never see a partial blob.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.flush()?;
        tmp.persist(self.path_for(key))
            .map_err(|e| AccordError::Io(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let pattern = format!("{}/*.json", self.dir.display());
        let mut keys: Vec<String> = glob::glob(&pattern)
            .map_err(|e| AccordError::Other(format!("Glob error: {e}")))?
            .filter_map(|r| r.ok())
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    blobs: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.blobs
            .lock()
            .map_err(|_| AccordError::Other("Memory store lock poisoned".into()))
    }
}

impl Backend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

/// Typed access to the blobs of one data directory.
pub struct Store {
    root: Option<PathBuf>,
    backend: Box<dyn Backend>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("root", &self.root).finish()
    }
}

impl Store {
    /// Open an existing data directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(AccordError::Other(format!(
                "Data directory '{}' does not exist (run `accord init`)",
                dir.display()
            )));
        }
        Ok(Store {
            root: Some(dir.to_path_buf()),
            backend: Box::new(FsBackend::new(dir)),
        })
    }

    /// Open a data directory, creating it if needed.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        Self::open(dir)
    }

    pub fn in_memory() -> Self {
        Store {
            root: None,
            backend: Box::new(MemoryBackend::new()),
        }
    }

    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Store {
            root: None,
            backend,
        }
    }

    /// Data directory, `None` for in-memory stores.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.backend.read(key)?.is_some())
    }

    /// Read `key`, or `T::default()` when absent. Corrupt JSON is an error.
    pub fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self.backend.read(key)? {
            None => {
                log::debug!("blob '{key}' absent, using default");
                Ok(T::default())
            }
            Some(raw) => {
                log::debug!("read blob '{key}' ({} bytes)", raw.len());
                serde_json::from_str(&raw).map_err(|source| AccordError::MalformedBlob {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    /// Read `key` as untyped JSON.
    pub fn load_raw(&self, key: &str) -> Result<Option<serde_json::Value>> {
        match self.backend.read(key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| AccordError::MalformedBlob {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    /// Overwrite `key` with the serialized value.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        log::debug!("write blob '{key}' ({} bytes)", json.len());
        self.backend.write(key, &json)
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let removed = self.backend.remove(key)?;
        if removed {
            log::debug!("removed blob '{key}'");
        }
        Ok(removed)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        self.backend.keys()
    }

    /// Stored size of `key` in bytes, 0 when absent.
    pub fn size_of(&self, key: &str) -> Result<usize> {
        Ok(self.backend.read(key)?.map(|raw| raw.len()).unwrap_or(0))
    }

    pub fn load_data(&self) -> Result<ChurchData> {
        self.load(CHURCH_DATA_KEY)
    }

    pub fn save_data(&self, data: &ChurchData) -> Result<()> {
        self.save(CHURCH_DATA_KEY, data)
    }

    /// Read-modify-write of the church-data blob.
    pub fn update_data<T>(&self, f: impl FnOnce(&mut ChurchData) -> Result<T>) -> Result<T> {
        let mut data = self.load_data()?;
        let out = f(&mut data)?;
        self.save_data(&data)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::schema::{Donation, Member};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_data() -> ChurchData {
        ChurchData {
            members: vec![Member {
                id: 1,
                first_name: "Ada".into(),
                last_name: "Mensah".into(),
                email: "ada@example.org".into(),
                ministries: vec!["worship".into()],
                ..Default::default()
            }],
            donations: vec![Donation {
                id: 2,
                donor_id: Some(1),
                donor_name: "Ada Mensah".into(),
                amount: Money::from_cents(12_345),
                date: crate::schema::parse_date("2024-01-05"),
                donation_type: "tithe".into(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_blob_loads_default() {
        let store = Store::in_memory();
        let data = store.load_data().unwrap();
        assert_eq!(data, ChurchData::default());
        assert_eq!(store.size_of(CHURCH_DATA_KEY).unwrap(), 0);
    }

    #[test]
    fn test_round_trip_on_disk() {
        let tmp = TempDir::new().unwrap();
        let store = Store::open(tmp.path()).unwrap();
        let data = sample_data();
        store.save_data(&data).unwrap();

        assert!(tmp.path().join("accordChurchData.json").exists());
        let reopened = Store::open(tmp.path()).unwrap();
        assert_eq!(reopened.load_data().unwrap(), data);
        assert_eq!(reopened.keys().unwrap(), vec![CHURCH_DATA_KEY.to_string()]);
    }

    #[test]
    fn test_malformed_blob_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("accordChurchData.json"), "{not json").unwrap();
        let store = Store::open(tmp.path()).unwrap();

        let err = store.load_data().unwrap_err();
        assert!(matches!(
            err,
            AccordError::MalformedBlob { ref key, .. } if key == CHURCH_DATA_KEY
        ));
    }

    #[test]
    fn test_update_data_keeps_other_sections() {
        let store = Store::in_memory();
        store
            .save(
                CHURCH_DATA_KEY,
                &serde_json::json!({"members": [], "prayerRequests": [{"id": 1}]}),
            )
            .unwrap();

        store
            .update_data(|data| {
                data.members.push(Member {
                    id: 5,
                    ..Default::default()
                });
                Ok(())
            })
            .unwrap();

        let raw = store.load_raw(CHURCH_DATA_KEY).unwrap().unwrap();
        assert_eq!(raw["prayerRequests"][0]["id"], 1);
        assert_eq!(raw["members"][0]["id"], 5);
    }

    #[test]
    fn test_open_requires_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(Store::open(tmp.path().join("missing")).is_err());
        let store = Store::create(tmp.path().join("missing")).unwrap();
        assert!(store.root().unwrap().is_dir());
    }

    #[test]
    fn test_remove() {
        let store = Store::in_memory();
        store.save(SETTINGS_KEY, &serde_json::json!({"a": 1})).unwrap();
        assert!(store.remove(SETTINGS_KEY).unwrap());
        assert!(!store.remove(SETTINGS_KEY).unwrap());
        assert!(!store.exists(SETTINGS_KEY).unwrap());
    }
}
