//! In-memory configuration storage

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{validate_name, ConfigStore};
use crate::document::Document;
use crate::error::{Error, Result};

/// In-memory configuration store keyed by configuration name
#[derive(Debug, Default)]
pub struct MemoryStore {
    label: String,
    items: RwLock<BTreeMap<String, Document>>,
}

impl MemoryStore {
    /// Create a new empty store with the given label
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            items: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a store pre-populated with items
    pub fn with_items<I, S>(label: &str, items: I) -> Self
    where
        I: IntoIterator<Item = (S, Document)>,
        S: Into<String>,
    {
        Self {
            label: label.to_string(),
            items: RwLock::new(items.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Get the number of stored items
    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all stored items, for assertions and debugging
    pub fn to_map(&self) -> Result<BTreeMap<String, Document>> {
        let items = self.items.read().map_err(|_| self.poisoned())?;
        Ok(items.clone())
    }

    fn poisoned(&self) -> Error {
        Error::LockPoisoned {
            context: format!("{} storage", self.label),
        }
    }
}

impl ConfigStore for MemoryStore {
    fn name(&self) -> &str {
        &self.label
    }

    fn read(&self, name: &str) -> Result<Option<Document>> {
        let items = self.items.read().map_err(|_| self.poisoned())?;
        Ok(items.get(name).cloned())
    }

    fn write(&self, name: &str, doc: &Document) -> Result<()> {
        validate_name(name)?;
        let mut items = self.items.write().map_err(|_| self.poisoned())?;
        items.insert(name.to_string(), doc.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let mut items = self.items.write().map_err(|_| self.poisoned())?;
        items.remove(name);
        Ok(())
    }

    fn list_all(&self, prefix: &str) -> Result<Vec<String>> {
        let items = self.items.read().map_err(|_| self.poisoned())?;
        Ok(items
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }
}
