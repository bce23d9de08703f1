//! # Configuration Snapshots
//!
//! A snapshot records, for every item an extension ships, two values at the
//! time of the last synchronization:
//!
//! - the item as the extension provided it (snapshot extension storage), and
//! - the item as it was in the active storage (snapshot active storage).
//!
//! The first is the merge base for upstream changes; the second is the
//! reference against which site customizations are detected. Items missing
//! from the active storage are recorded with the absent marker so that
//! "never installed" stays distinguishable from "installed empty".
//!
//! Snapshots are only ever overwritten wholesale, per item, so an interrupted
//! full snapshot leaves stale but never half-written items behind.

use std::sync::Arc;

use log::{debug, info};

use crate::document;
use crate::error::Result;
use crate::extension::{ExtensionRegistry, ExtensionType};
use crate::store::{ConfigStore, SyncStores};

/// Takes snapshots of extension-provided configuration
pub struct Snapshotter {
    registry: Arc<dyn ExtensionRegistry>,
    stores: SyncStores,
}

impl Snapshotter {
    /// Create a snapshotter over the given extensions and stores
    pub fn new(registry: Arc<dyn ExtensionRegistry>, stores: SyncStores) -> Self {
        Self { registry, stores }
    }

    /// Snapshot every item provided by one extension.
    ///
    /// Extensions without install configuration are silently skipped.
    pub fn create_extension_snapshot(&self, extension_type: ExtensionType, name: &str) -> Result<()> {
        let Some(install) = self.registry.install_storage(extension_type, name) else {
            debug!("{} {} provides no configuration to snapshot", extension_type, name);
            return Ok(());
        };

        let item_names = install.list_all("")?;
        for item_name in &item_names {
            self.create_item_snapshot(install.as_ref(), item_name)?;
        }
        info!(
            "Snapshotted {} item(s) provided by {} {}",
            item_names.len(),
            extension_type,
            name
        );
        Ok(())
    }

    /// Snapshot one item as provided by `install` and as currently active.
    pub fn create_item_snapshot(&self, install: &dyn ConfigStore, item_name: &str) -> Result<()> {
        let Some(provided) = install.read(item_name)? else {
            return Ok(());
        };
        self.stores.snapshot_extension.write(item_name, &provided)?;

        let active = self
            .stores
            .active
            .read(item_name)?
            .unwrap_or_else(document::absent);
        self.stores.snapshot_active.write(item_name, &active)?;
        Ok(())
    }

    /// Snapshot only the named items of one extension.
    pub fn create_items_snapshot(
        &self,
        extension_type: ExtensionType,
        name: &str,
        item_names: &[String],
    ) -> Result<()> {
        let Some(install) = self.registry.install_storage(extension_type, name) else {
            return Ok(());
        };
        for item_name in item_names {
            self.create_item_snapshot(install.as_ref(), item_name)?;
        }
        debug!(
            "Snapshotted {} selected item(s) provided by {} {}",
            item_names.len(),
            extension_type,
            name
        );
        Ok(())
    }

    /// Snapshot several extensions of the same type.
    pub fn create_extension_snapshot_multiple(
        &self,
        extension_type: ExtensionType,
        names: &[String],
    ) -> Result<()> {
        for name in names {
            self.create_extension_snapshot(extension_type, name)?;
        }
        Ok(())
    }

    /// Replace the whole snapshot with one of every installed extension.
    ///
    /// The install profile is snapshotted last so that its copy of an item
    /// shipped by several extensions is the one recorded.
    pub fn create_full_snapshot(&self) -> Result<()> {
        self.delete_snapshot()?;
        let profile = self.registry.install_profile();
        for extension_type in ExtensionType::ALL {
            let mut names = self.registry.list_installed(extension_type);
            if extension_type == ExtensionType::Module {
                if let Some(profile) = &profile {
                    if let Some(position) = names.iter().position(|name| name == profile) {
                        let profile = names.remove(position);
                        names.push(profile);
                    }
                }
            }
            self.create_extension_snapshot_multiple(extension_type, &names)?;
        }
        Ok(())
    }

    /// Clear both snapshot stores.
    pub fn delete_snapshot(&self) -> Result<()> {
        self.stores.snapshot_extension.delete_all("")?;
        self.stores.snapshot_active.delete_all("")?;
        debug!("Deleted configuration snapshot");
        Ok(())
    }
}
