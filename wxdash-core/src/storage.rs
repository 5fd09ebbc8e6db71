//! Local persistence for the watch-list.
//!
//! The store is a plain string-keyed slot: the whole list is serialized into
//! one value, read once at startup and overwritten on every change.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::model::WatchedCity;

/// Slot holding the JSON watch-list array.
pub const CITIES_KEY: &str = "cities";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize watch-list: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Minimal key-value slot store.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.slot_path(key);
        fs::write(&path, value).map_err(|source| StorageError::Io { path, source })
    }
}

/// In-memory store, handy for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `set` has been called.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.writes += 1;
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read the persisted watch-list.
///
/// A missing slot is an empty list. A slot that does not parse is logged and
/// also treated as empty so a corrupt file never blocks startup.
pub fn load_cities<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<WatchedCity>, StorageError> {
    let Some(raw) = store.get(CITIES_KEY)? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str(&raw) {
        Ok(cities) => Ok(cities),
        Err(e) => {
            tracing::warn!("Ignoring unreadable watch-list: {e}");
            Ok(Vec::new())
        }
    }
}

/// Overwrite the persisted watch-list.
pub fn save_cities<S: KeyValueStore + ?Sized>(
    store: &mut S,
    cities: &[WatchedCity],
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(cities)?;
    store.set(CITIES_KEY, &raw)?;
    tracing::debug!("Persisted {} watched cities", cities.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, MainReading, WindReading};

    fn city(name: &str) -> WatchedCity {
        WatchedCity {
            name: name.into(),
            id: None,
            coord: None,
            main: MainReading { temp: 290.0, humidity: 50 },
            wind: WindReading { speed: 2.0 },
            weather: vec![Condition { description: "few clouds".into(), icon: "02d".into() }],
            dt: None,
        }
    }

    #[test]
    fn missing_slot_loads_empty() {
        let store = MemoryStore::new();
        assert!(load_cities(&store).unwrap().is_empty());
    }

    #[test]
    fn corrupt_slot_loads_empty() {
        let mut store = MemoryStore::new();
        store.set(CITIES_KEY, "{not json").unwrap();
        assert!(load_cities(&store).unwrap().is_empty());
    }

    #[test]
    fn file_store_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data");

        let mut store = FileStore::new(&nested);
        save_cities(&mut store, &[city("Paris"), city("Oslo")]).unwrap();
        assert!(nested.join("cities.json").exists());

        let reopened = FileStore::new(&nested);
        let loaded = load_cities(&reopened).unwrap();
        let names: Vec<_> = loaded.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Paris", "Oslo"]);
    }

    #[test]
    fn file_store_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get(CITIES_KEY).unwrap(), None);
    }

    #[test]
    fn save_overwrites_whole_slot() {
        let mut store = MemoryStore::new();
        save_cities(&mut store, &[city("Paris"), city("Oslo")]).unwrap();
        save_cities(&mut store, &[city("Lima")]).unwrap();

        let loaded = load_cities(&store).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Lima");
        assert_eq!(store.writes(), 2);
    }
}
