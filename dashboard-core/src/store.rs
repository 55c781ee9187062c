//! Watchlist persistence on top of a string key-value store.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::PathBuf,
};

use crate::PersistenceError;

/// Slot holding the serialized watchlist.
pub const WATCHLIST_KEY: &str = "weatherCities";

/// Synchronous string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// In-process store; contents are lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a single JSON object file, one member per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        // Unparsable JSON is replaced; I/O failures leave the file untouched.
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(PersistenceError::Parse(err)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "discarding corrupt storage file"
                );
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}

/// Loads and saves the ordered list of watched city names.
#[derive(Debug)]
pub struct WatchlistStore<S> {
    store: S,
}

impl<S: KeyValueStore> WatchlistStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Missing or unreadable data yields an empty watchlist.
    pub fn load(&self) -> Vec<String> {
        match self.try_load() {
            Ok(cities) => cities,
            Err(err) => {
                tracing::warn!(error = %err, "could not restore watchlist, starting empty");
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<String>, PersistenceError> {
        match self.store.get(WATCHLIST_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Overwrites the slot with `cities`. Failures are logged only.
    pub fn save(&mut self, cities: &[String]) {
        let result = serde_json::to_string(cities)
            .map_err(PersistenceError::from)
            .and_then(|raw| self.store.set(WATCHLIST_KEY, &raw));
        if let Err(err) = result {
            tracing::warn!(error = %err, "could not persist watchlist");
        }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}
