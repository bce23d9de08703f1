//! # Change Listing
//!
//! Lists the configuration an extension would create or update if it were
//! synchronized now.
//!
//! ## Process
//!
//! 1.  **Upstream changes**: the extension's install configuration is
//!     compared against the snapshot of extension-provided configuration.
//!     Only creates and updates are kept; deletes and renames are never
//!     applied automatically.
//! 2.  **Install profile**: updates to items the install profile also ships
//!     are dropped, unless the extension being listed is the profile itself.
//! 3.  **Safe changes**: when only safe changes are requested, anything the
//!     site touched since the last snapshot is pruned (see
//!     [`Lister::set_safe_changes`]).
//!
//! The site changelist used by step 3 is computed once and cached until
//! [`Lister::reset`] is called.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use log::debug;
use serde::Serialize;

use crate::comparer::{split_rename, ChangeKind, Changelist, ReadFailurePolicy, StorageComparer};
use crate::diff::ConfigDiff;
use crate::error::{Error, Result};
use crate::extension::{ExtensionRegistry, ExtensionType};
use crate::store::SyncStores;

/// Per-extension changelists keyed by extension type, then machine name.
///
/// Extensions without changes are never recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FullChangelist {
    extensions: BTreeMap<ExtensionType, BTreeMap<String, Changelist>>,
}

impl FullChangelist {
    /// Create an empty full changelist
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the changes of one extension; empty changelists are ignored.
    pub fn insert(&mut self, extension_type: ExtensionType, name: &str, changelist: Changelist) {
        if changelist.is_empty() {
            return;
        }
        self.extensions
            .entry(extension_type)
            .or_default()
            .insert(name.to_string(), changelist);
    }

    /// The changes of one extension, if it has any.
    pub fn get(&self, extension_type: ExtensionType, name: &str) -> Option<&Changelist> {
        self.extensions.get(&extension_type)?.get(name)
    }

    /// Iterate over `(type, name, changelist)` in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (ExtensionType, &str, &Changelist)> {
        self.extensions.iter().flat_map(|(extension_type, extensions)| {
            extensions
                .iter()
                .map(move |(name, changelist)| (*extension_type, name.as_str(), changelist))
        })
    }

    /// Total number of configuration items across all extensions.
    pub fn count(&self) -> usize {
        self.iter().map(|(_, _, changelist)| changelist.len()).sum()
    }

    /// Whether no extension has changes.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

/// Lists pending configuration changes per extension
pub struct Lister {
    registry: Arc<dyn ExtensionRegistry>,
    stores: SyncStores,
    differ: ConfigDiff,
    read_failure: ReadFailurePolicy,
    site_changelist: Mutex<Option<Changelist>>,
}

impl Lister {
    /// Create a lister over the given extensions and stores
    pub fn new(registry: Arc<dyn ExtensionRegistry>, stores: SyncStores, differ: ConfigDiff) -> Self {
        Self {
            registry,
            stores,
            differ,
            read_failure: ReadFailurePolicy::default(),
            site_changelist: Mutex::new(None),
        }
    }

    /// Set how unreadable items are handled by the comparisons
    pub fn with_read_failure_policy(mut self, policy: ReadFailurePolicy) -> Self {
        self.read_failure = policy;
        self
    }

    /// The differ used for update detection
    pub fn differ(&self) -> &ConfigDiff {
        &self.differ
    }

    /// Changes every installed module, then every installed theme, would make.
    pub fn get_full_changelist(&self, safe_only: bool) -> Result<FullChangelist> {
        let mut full = FullChangelist::new();
        for extension_type in ExtensionType::ALL {
            for name in self.registry.list_installed(extension_type) {
                let changelist = self.get_extension_changelist(extension_type, &name, safe_only)?;
                full.insert(extension_type, &name, changelist);
            }
        }
        Ok(full)
    }

    /// Items one extension would create or update.
    ///
    /// An extension without install configuration yields an empty changelist.
    pub fn get_extension_changelist(
        &self,
        extension_type: ExtensionType,
        name: &str,
        safe_only: bool,
    ) -> Result<Changelist> {
        let Some(install) = self.registry.install_storage(extension_type, name) else {
            return Ok(Changelist::new());
        };

        let mut changelist = StorageComparer::new(
            install.as_ref(),
            self.stores.snapshot_extension.as_ref(),
            &self.differ,
        )
        .with_read_failure_policy(self.read_failure)
        .create_changelist()?;
        changelist.restrict(&[ChangeKind::Create, ChangeKind::Update]);

        if !self.is_profile(extension_type, name) {
            let profile_items = self.install_profile_items()?;
            if !profile_items.is_empty() {
                changelist.retain(ChangeKind::Update, |item| {
                    !profile_items.iter().any(|provided| provided == item)
                });
            }
        }

        if safe_only {
            self.set_safe_changes(&mut changelist)?;
        }

        changelist.drop_empty();
        debug!(
            "{} {}: {} pending change(s){}",
            extension_type,
            name,
            changelist.len(),
            if safe_only { " (safe only)" } else { "" }
        );
        Ok(changelist)
    }

    /// Prune changes that would overwrite or resurrect site customizations.
    ///
    /// - a create is dropped when the site deleted the item, or renamed it
    ///   away, since the last snapshot, or already has an item by that name;
    /// - an update is dropped when the site edited, deleted or renamed away
    ///   the item since the last snapshot, or does not have it at all.
    pub fn set_safe_changes(&self, changelist: &mut Changelist) -> Result<()> {
        let site = self.site_changelist()?;
        let active: BTreeSet<String> = self.stores.active.list_all("")?.into_iter().collect();
        let renamed_away: BTreeSet<&str> = site
            .get(ChangeKind::Rename)
            .iter()
            .filter_map(|entry| split_rename(entry))
            .map(|(old_name, _)| old_name)
            .collect();
        let removed_by_site =
            |item: &str| site.contains(ChangeKind::Delete, item) || renamed_away.contains(item);

        changelist.retain(ChangeKind::Create, |item| {
            !(removed_by_site(item) || active.contains(item))
        });
        changelist.retain(ChangeKind::Update, |item| {
            !(site.contains(ChangeKind::Update, item) || removed_by_site(item))
                && active.contains(item)
        });
        Ok(())
    }

    /// What the site changed since the last snapshot.
    ///
    /// The active storage is compared against the active snapshot, so a
    /// snapshotted item missing from the site shows up as a delete and a
    /// hand-edited item as an update. Items recorded as absent at snapshot
    /// time are not considered at all.
    pub fn site_changelist(&self) -> Result<Changelist> {
        let mut cached = self
            .site_changelist
            .lock()
            .map_err(|_| Error::LockPoisoned {
                context: "site changelist cache".to_string(),
            })?;
        if let Some(changelist) = cached.as_ref() {
            return Ok(changelist.clone());
        }

        let changelist = StorageComparer::new(
            self.stores.active.as_ref(),
            self.stores.snapshot_active.as_ref(),
            &self.differ,
        )
        .with_read_failure_policy(self.read_failure)
        .create_changelist()?;
        *cached = Some(changelist.clone());
        Ok(changelist)
    }

    /// Forget the cached site changelist.
    pub fn reset(&self) {
        if let Ok(mut cached) = self.site_changelist.lock() {
            *cached = None;
        }
    }

    fn is_profile(&self, extension_type: ExtensionType, name: &str) -> bool {
        extension_type == ExtensionType::Module
            && self.registry.install_profile().as_deref() == Some(name)
    }

    /// Names of the items the install profile ships.
    fn install_profile_items(&self) -> Result<Vec<String>> {
        let Some(profile) = self.registry.install_profile() else {
            return Ok(Vec::new());
        };
        match self.registry.install_storage(ExtensionType::Module, &profile) {
            Some(storage) => storage.list_all(""),
            None => Ok(Vec::new()),
        }
    }
}
