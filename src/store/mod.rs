//! # Configuration Storage
//!
//! This module defines the `ConfigStore` trait, the narrow interface through
//! which every part of the synchronization engine reads and writes
//! configuration, together with its implementations.
//!
//! ## Design
//!
//! Four logical stores take part in a synchronization:
//!
//! - **extension install**: the configuration every installed extension
//!   ships in its `config/install` directory (read-only, see
//!   [`ExtensionInstallStorage`]).
//! - **active**: the live site configuration.
//! - **snapshot extension**: extension-provided configuration as captured at
//!   the last synchronization.
//! - **snapshot active**: active configuration as captured at the last
//!   synchronization.
//!
//! All of them share the same document format and are interchangeable behind
//! the trait, which keeps the engine independent of where configuration
//! actually lives. [`MemoryStore`] backs tests and in-process use,
//! [`FileStore`] a directory of YAML files.

mod extension;
mod file;
mod memory;

pub use extension::ExtensionInstallStorage;
pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use crate::document::Document;
use crate::error::{Error, Result};

/// File extension used for configuration documents on disk.
pub const FILE_EXTENSION: &str = "yml";

/// Trait for configuration storage - allows swapping backends and mocking in
/// tests
///
/// Writes take `&self`: implementations guard their own state so that the
/// lister, snapshotter and manager can share one handle per store.
pub trait ConfigStore: Send + Sync {
    /// Short label used in log messages and errors (e.g. `active`).
    fn name(&self) -> &str;

    /// Check whether an item is stored under `name`.
    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.read(name)?.is_some())
    }

    /// Read a configuration item, or `None` when nothing is stored.
    fn read(&self, name: &str) -> Result<Option<Document>>;

    /// Create or replace a configuration item.
    fn write(&self, name: &str, doc: &Document) -> Result<()>;

    /// Delete a configuration item. Deleting a missing item is not an error.
    fn delete(&self, name: &str) -> Result<()>;

    /// List the names of all stored items starting with `prefix`, sorted.
    fn list_all(&self, prefix: &str) -> Result<Vec<String>>;

    /// Delete every item whose name starts with `prefix`.
    fn delete_all(&self, prefix: &str) -> Result<()> {
        for name in self.list_all(prefix)? {
            self.delete(&name)?;
        }
        Ok(())
    }
}

/// Handles on the writable stores taking part in a synchronization
#[derive(Clone)]
pub struct SyncStores {
    /// The live site configuration
    pub active: Arc<dyn ConfigStore>,
    /// Extension-provided configuration as of the last snapshot
    pub snapshot_extension: Arc<dyn ConfigStore>,
    /// Active configuration as of the last snapshot
    pub snapshot_active: Arc<dyn ConfigStore>,
}

impl SyncStores {
    /// Fresh in-memory stores, for tests and dry runs
    pub fn in_memory() -> Self {
        Self {
            active: Arc::new(MemoryStore::new("active")),
            snapshot_extension: Arc::new(MemoryStore::new("snapshot extension")),
            snapshot_active: Arc::new(MemoryStore::new("snapshot active")),
        }
    }
}

/// Validate a configuration name before using it as a storage key.
///
/// Names are dotted machine names such as `node.type.article`; they must not
/// be empty and must not be able to escape a storage directory.
pub fn validate_name(name: &str) -> Result<()> {
    let problem = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.contains('/') || name.contains('\\') {
        Some("name contains a path separator")
    } else if name.contains("..") {
        Some("name contains '..'")
    } else if name.chars().any(char::is_control) {
        Some("name contains control characters")
    } else {
        None
    };

    match problem {
        Some(message) => Err(Error::InvalidName {
            name: name.to_string(),
            message: message.to_string(),
        }),
        None => Ok(()),
    }
}
