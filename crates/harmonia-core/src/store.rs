//! Named progression storage

use std::collections::BTreeMap;

use crate::error::{HarmoniaError, Result};
use crate::progression::Progression;

/// Key-value storage of progressions by name
pub trait ProgressionStore {
    fn save(&mut self, name: &str, chords: &Progression) -> Result<()>;
    fn load(&self, name: &str) -> Result<Option<Progression>>;
    /// Stored names in sorted order
    fn list(&self) -> Result<Vec<String>>;
    /// Returns whether anything was removed
    fn delete(&mut self, name: &str) -> Result<bool>;
}

/// Reject entries that should never be persisted
pub fn validate_entry(name: &str, chords: &Progression) -> Result<()> {
    if name.trim().is_empty() {
        return Err(HarmoniaError::InvalidName);
    }
    if chords.is_empty() {
        return Err(HarmoniaError::EmptyProgression);
    }
    Ok(())
}

/// In-process store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Progression>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressionStore for MemoryStore {
    fn save(&mut self, name: &str, chords: &Progression) -> Result<()> {
        validate_entry(name, chords)?;
        self.entries.insert(name.to_string(), chords.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<Progression>> {
        Ok(self.entries.get(name).cloned())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn delete(&mut self, name: &str) -> Result<bool> {
        Ok(self.entries.remove(name).is_some())
    }
}
