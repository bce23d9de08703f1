//! Aggregate view over every installed extension's install configuration

use std::collections::BTreeSet;
use std::sync::Arc;

use super::ConfigStore;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::extension::{ExtensionRegistry, ExtensionType};

/// Read-only store combining the install-time configuration of all installed
/// extensions.
///
/// When several extensions ship the same item, the install profile's copy
/// wins, then modules before themes in registry order.
pub struct ExtensionInstallStorage {
    registry: Arc<dyn ExtensionRegistry>,
}

impl ExtensionInstallStorage {
    /// Create an aggregate store over the extensions in `registry`.
    pub fn new(registry: Arc<dyn ExtensionRegistry>) -> Self {
        Self { registry }
    }

    /// Installed extensions in lookup order, profile first.
    fn providers(&self) -> Vec<(ExtensionType, String)> {
        let profile = self.registry.install_profile();
        let mut providers = Vec::new();
        if let Some(profile) = &profile {
            providers.push((ExtensionType::Module, profile.clone()));
        }
        for extension_type in ExtensionType::ALL {
            for name in self.registry.list_installed(extension_type) {
                if extension_type == ExtensionType::Module && Some(&name) == profile.as_ref() {
                    continue;
                }
                providers.push((extension_type, name));
            }
        }
        providers
    }

    /// The extension whose copy of `name` this store returns.
    pub fn provider(&self, name: &str) -> Result<Option<(ExtensionType, String)>> {
        for (extension_type, extension) in self.providers() {
            if let Some(storage) = self.registry.install_storage(extension_type, &extension) {
                if storage.exists(name)? {
                    return Ok(Some((extension_type, extension)));
                }
            }
        }
        Ok(None)
    }
}

impl ConfigStore for ExtensionInstallStorage {
    fn name(&self) -> &str {
        "extension install"
    }

    fn read(&self, name: &str) -> Result<Option<Document>> {
        for (extension_type, extension) in self.providers() {
            if let Some(storage) = self.registry.install_storage(extension_type, &extension) {
                if let Some(doc) = storage.read(name)? {
                    return Ok(Some(doc));
                }
            }
        }
        Ok(None)
    }

    fn write(&self, _name: &str, _doc: &Document) -> Result<()> {
        Err(Error::ReadOnlyStore {
            store: self.name().to_string(),
        })
    }

    fn delete(&self, _name: &str) -> Result<()> {
        Err(Error::ReadOnlyStore {
            store: self.name().to_string(),
        })
    }

    fn list_all(&self, prefix: &str) -> Result<Vec<String>> {
        let mut names = BTreeSet::new();
        for (extension_type, extension) in self.providers() {
            if let Some(storage) = self.registry.install_storage(extension_type, &extension) {
                names.extend(storage.list_all(prefix)?);
            }
        }
        Ok(names.into_iter().collect())
    }
}
