//! String key/value persistence of the active model.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use modelsight_scene::MarkerTarget;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Slot holding the local path of the active model.
pub const CURRENT_MODEL_URI: &str = "currentModelUri";
/// Slot holding [`ModelMetadata`] as JSON.
pub const CURRENT_MODEL_METADATA: &str = "currentModelMetadata";
/// Optional slot holding the marker image URI used in marker mode.
pub const CURRENT_MARKER_IMAGE: &str = "currentMarkerImage";

/// A string key/value store. Last writer wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten atomically on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let bytes = modelsight_fs::atomic_read(&self.path)?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        modelsight_fs::atomic_write(&self.path, &bytes)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        f(&mut entries);
        self.save(&entries)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// Where the active model came from and where it lives now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// How the reference was obtained, e.g. `qr`.
    pub source:     String,
    pub source_uri: String,
    pub local_path: PathBuf,
    pub timestamp:  DateTime<Utc>,
}

impl ModelMetadata {
    /// Metadata for a model obtained by scanning a code.
    pub fn scanned(source_uri: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            source:     "qr".into(),
            source_uri: source_uri.into(),
            local_path: local_path.into(),
            timestamp:  Utc::now(),
        }
    }
}

/// The slots through which the renderer learns which model to show and,
/// in marker mode, which image to anchor it to.
#[derive(Debug)]
pub struct SessionPersistence<S> {
    store: S,
}

impl<S: KeyValueStore> SessionPersistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn save(&self, metadata: &ModelMetadata) -> Result<()> {
        let json = serde_json::to_string(metadata)?;
        self.store
            .set(CURRENT_MODEL_URI, &metadata.local_path.to_string_lossy())?;
        self.store.set(CURRENT_MODEL_METADATA, &json)?;
        Ok(())
    }

    pub fn current_uri(&self) -> Result<Option<String>> {
        self.store.get(CURRENT_MODEL_URI)
    }

    pub fn current_metadata(&self) -> Result<Option<ModelMetadata>> {
        match self.store.get(CURRENT_MODEL_METADATA)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save_marker_image(&self, uri: &str) -> Result<()> {
        self.store.set(CURRENT_MARKER_IMAGE, uri)
    }

    pub fn marker_image(&self) -> Result<Option<String>> {
        Ok(self
            .store
            .get(CURRENT_MARKER_IMAGE)?
            .filter(|uri| !uri.trim().is_empty()))
    }

    /// The stored marker, or the bundled one when none was saved.
    pub fn marker_target(&self) -> Result<MarkerTarget> {
        Ok(self
            .marker_image()?
            .map_or_else(MarkerTarget::default, MarkerTarget::uri))
    }

    pub fn clear(&self) -> Result<()> {
        self.store.remove(CURRENT_MODEL_URI)?;
        self.store.remove(CURRENT_MODEL_METADATA)?;
        self.store.remove(CURRENT_MARKER_IMAGE)
    }
}
