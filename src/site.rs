//! Wiring a site manifest into stores and services

use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::config::{self, SiteConfig};
use crate::diff::ConfigDiff;
use crate::entity::EntityTypeResolver;
use crate::error::{Error, Result};
use crate::extension::{ExtensionRegistry, ExtensionType, SiteRegistry};
use crate::lister::Lister;
use crate::manager::SyncManager;
use crate::revert::StoreReverter;
use crate::snapshot::Snapshotter;
use crate::store::{ConfigStore, ExtensionInstallStorage, FileStore, SyncStores};

/// Subdirectory of the snapshot directory holding extension-provided copies.
pub const SNAPSHOT_EXTENSION_DIR: &str = "extension";

/// Subdirectory of the snapshot directory holding active copies.
pub const SNAPSHOT_ACTIVE_DIR: &str = "active";

/// A site opened from its manifest, with every service wired up
pub struct Site {
    pub config: SiteConfig,
    pub registry: Arc<dyn ExtensionRegistry>,
    pub stores: SyncStores,
    pub install: Arc<ExtensionInstallStorage>,
    pub lister: Arc<Lister>,
    pub snapshotter: Arc<Snapshotter>,
    pub resolver: EntityTypeResolver,
    pub manager: SyncManager,
}

impl Site {
    /// Load the manifest at `path` and open the site it describes.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(config::from_file(path)?)
    }

    /// Open the site described by `config`.
    pub fn open(config: SiteConfig) -> Result<Self> {
        let active_dir = config.active_dir();
        if !active_dir.is_dir() {
            return Err(Error::ConfigParse {
                message: format!(
                    "Active configuration directory not found: {}",
                    active_dir.display()
                ),
                hint: Some("Check the 'active' path in the manifest".to_string()),
            });
        }

        let mut registry = SiteRegistry::new();
        for (name, root) in &config.modules {
            registry.add(ExtensionType::Module, name, config.resolve(root));
        }
        for (name, root) in &config.themes {
            registry.add(ExtensionType::Theme, name, config.resolve(root));
        }
        registry.set_profile(config.profile.clone());
        let registry: Arc<dyn ExtensionRegistry> = Arc::new(registry);

        let snapshot_dir = config.snapshot_dir();
        let stores = SyncStores {
            active: Arc::new(FileStore::new("active", &active_dir)),
            snapshot_extension: Arc::new(FileStore::new(
                "snapshot extension",
                snapshot_dir.join(SNAPSHOT_EXTENSION_DIR),
            )),
            snapshot_active: Arc::new(FileStore::new(
                "snapshot active",
                snapshot_dir.join(SNAPSHOT_ACTIVE_DIR),
            )),
        };
        debug!(
            "Opened site: active {}, snapshot {}",
            active_dir.display(),
            snapshot_dir.display()
        );

        let install = Arc::new(ExtensionInstallStorage::new(registry.clone()));
        let install_store: Arc<dyn ConfigStore> = install.clone();

        let mut resolver = EntityTypeResolver::default();
        for (prefix, entity_type) in &config.entity_types {
            resolver.register(prefix, entity_type);
        }

        let lister = Arc::new(
            Lister::new(
                registry.clone(),
                stores.clone(),
                ConfigDiff::new(config.ignore_keys.iter().cloned()),
            )
            .with_read_failure_policy(config.on_read_error),
        );
        let snapshotter = Arc::new(Snapshotter::new(registry.clone(), stores.clone()));
        let reverter = Arc::new(StoreReverter::new(
            install_store.clone(),
            stores.active.clone(),
        ));
        let manager = SyncManager::new(
            registry.clone(),
            lister.clone(),
            snapshotter.clone(),
            reverter,
            install_store,
            stores.clone(),
        )
        .with_mode(config.update_mode)
        .with_error_policy(config.on_error)
        .with_resolver(resolver.clone());

        Ok(Self {
            config,
            registry,
            stores,
            install,
            lister,
            snapshotter,
            resolver,
            manager,
        })
    }

    /// Fail unless the extension is installed on this site.
    pub fn require_extension(&self, extension_type: ExtensionType, name: &str) -> Result<()> {
        if self.registry.is_installed(extension_type, name) {
            Ok(())
        } else {
            Err(Error::UnknownExtension {
                extension_type: extension_type.to_string(),
                name: name.to_string(),
            })
        }
    }

    /// Whether a snapshot has ever been taken.
    pub fn has_snapshot(&self) -> Result<bool> {
        Ok(!self.stores.snapshot_extension.list_all("")?.is_empty())
    }
}
