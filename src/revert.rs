//! Applying single configuration items to the active storage

use std::sync::Arc;

use log::debug;
use serde_yaml::Value;

use crate::diff::DEFAULT_IGNORE_KEYS;
use crate::document::{self, Document};
use crate::error::{Error, Result};
use crate::store::ConfigStore;

/// Trait for applying extension-provided configuration to the site - allows
/// mocking in tests
pub trait ConfigReverter: Send + Sync {
    /// Create `name` in the active storage from the provided configuration.
    ///
    /// An item the site already has is never overwritten.
    fn import(&self, entity_type: &str, name: &str) -> Result<()>;

    /// Overwrite the active copy of `name` with the provided configuration.
    ///
    /// An item missing from the site is never recreated.
    fn revert(&self, entity_type: &str, name: &str) -> Result<()>;
}

/// Reverter copying documents from an install store into the active store
pub struct StoreReverter {
    install: Arc<dyn ConfigStore>,
    active: Arc<dyn ConfigStore>,
}

impl StoreReverter {
    pub fn new(install: Arc<dyn ConfigStore>, active: Arc<dyn ConfigStore>) -> Self {
        Self { install, active }
    }

    fn provided(&self, name: &str) -> std::result::Result<Document, String> {
        match self.install.read(name) {
            Ok(Some(doc)) => Ok(doc),
            Ok(None) => Err("not provided by any installed extension".to_string()),
            Err(err) => Err(err.to_string()),
        }
    }

    fn active_copy(&self, name: &str) -> std::result::Result<Option<Document>, String> {
        self.active
            .read(name)
            .map(|doc| doc.filter(|doc| !document::is_absent(doc)))
            .map_err(|err| err.to_string())
    }
}

/// Copy the active identity keys of `existing` onto `doc`.
fn preserve_identity(existing: &Document, doc: &mut Document) {
    if let (Value::Mapping(existing), Value::Mapping(target)) = (existing, doc) {
        for key in DEFAULT_IGNORE_KEYS {
            if let Some(value) = existing.get(*key) {
                target.insert(Value::String(key.to_string()), value.clone());
            }
        }
    }
}

impl ConfigReverter for StoreReverter {
    /// Fails when the item already exists in the active storage.
    fn import(&self, entity_type: &str, name: &str) -> Result<()> {
        let to_error = |message: String| Error::Import {
            entity_type: entity_type.to_string(),
            name: name.to_string(),
            message,
        };
        if self.active_copy(name).map_err(to_error)?.is_some() {
            return Err(to_error("already exists in the active configuration".to_string()));
        }
        let doc = self.provided(name).map_err(to_error)?;
        self.active
            .write(name, &doc)
            .map_err(|err| to_error(err.to_string()))?;
        debug!("Imported {} {}", entity_type, name);
        Ok(())
    }

    /// Fails when the item is missing from the active storage.
    fn revert(&self, entity_type: &str, name: &str) -> Result<()> {
        let to_error = |message: String| Error::Revert {
            entity_type: entity_type.to_string(),
            name: name.to_string(),
            message,
        };
        let Some(existing) = self.active_copy(name).map_err(to_error)? else {
            return Err(to_error("not in the active configuration".to_string()));
        };
        let mut doc = self.provided(name).map_err(to_error)?;
        preserve_identity(&existing, &mut doc);
        self.active
            .write(name, &doc)
            .map_err(|err| to_error(err.to_string()))?;
        debug!("Reverted {} {}", entity_type, name);
        Ok(())
    }
}
