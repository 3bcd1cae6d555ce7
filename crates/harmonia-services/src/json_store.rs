//! Progression store backed by a single JSON file

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use harmonia_core::{validate_entry, HarmoniaError, Progression, ProgressionStore};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed progression file: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StoreError> for HarmoniaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(e) => HarmoniaError::Io(e),
            StoreError::Json(e) => HarmoniaError::Storage(e.to_string()),
        }
    }
}

type Entries = BTreeMap<String, Progression>;

/// Keeps every saved progression in one `{ "name": [chords...] }` object
#[derive(Debug, Clone)]
pub struct JsonProgressionStore {
    path: PathBuf,
}

impl JsonProgressionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Entries, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Entries::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &Entries) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, text)?;
        debug!(path = %self.path.display(), entries = entries.len(), "Progressions written");
        Ok(())
    }
}

impl ProgressionStore for JsonProgressionStore {
    fn save(&mut self, name: &str, chords: &Progression) -> harmonia_core::Result<()> {
        validate_entry(name, chords)?;
        let mut entries = self.read_all()?;
        entries.insert(name.to_string(), chords.clone());
        self.write_all(&entries)?;
        info!(name, chords = chords.len(), "Progression saved");
        Ok(())
    }

    fn load(&self, name: &str) -> harmonia_core::Result<Option<Progression>> {
        Ok(self.read_all()?.remove(name))
    }

    fn list(&self) -> harmonia_core::Result<Vec<String>> {
        Ok(self.read_all()?.into_keys().collect())
    }

    fn delete(&mut self, name: &str) -> harmonia_core::Result<bool> {
        let mut entries = self.read_all()?;
        if entries.remove(name).is_none() {
            return Ok(false);
        }
        self.write_all(&entries)?;
        info!(name, "Progression deleted");
        Ok(true)
    }
}
