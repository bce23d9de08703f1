//! # Synchronization
//!
//! The [`SyncManager`] applies changelists to the active storage and keeps
//! the snapshot current afterwards.
//!
//! ## Applying changes
//!
//! - **create**: the item is imported fresh from the extension.
//! - **update**: depending on [`UpdateMode`], the item is either merged
//!   three-way (snapshot of the extension's copy, the extension's current
//!   copy, the site's copy) or overwritten with the extension's copy.
//!
//! Items are applied one at a time and never rolled back. With
//! [`ErrorPolicy::Continue`] a failing item is recorded in the
//! [`UpdateReport`] and the remaining items are still applied.
//!
//! Whatever happens, the extension is re-snapshotted before returning, so
//! the next comparison starts from the current state.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::comparer::{ChangeKind, Changelist};
use crate::document::{self, Document};
use crate::entity::EntityTypeResolver;
use crate::error::{Error, Result};
use crate::extension::{ExtensionRegistry, ExtensionType};
use crate::lister::Lister;
use crate::merge::merge;
use crate::revert::ConfigReverter;
use crate::snapshot::Snapshotter;
use crate::store::{ConfigStore, SyncStores};

/// How `update` items are applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Three-way merge of upstream changes into the site's copy
    #[default]
    Merge,
    /// Overwrite the site's copy with the extension's
    Revert,
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateMode::Merge => write!(f, "merge"),
            UpdateMode::Revert => write!(f, "revert"),
        }
    }
}

/// What to do when a single item cannot be applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Record the failure and go on with the next item
    #[default]
    Continue,
    /// Stop at the first failure
    Abort,
}

/// An item that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub name: String,
    pub kind: ChangeKind,
    pub message: String,
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.name, self.message)
    }
}

/// Outcome of applying one or more changelists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    /// Items created in the active storage
    pub created: Vec<String>,
    /// Items updated in the active storage
    pub updated: Vec<String>,
    /// New items left alone because the site already has them
    pub skipped: Vec<String>,
    /// Items that failed to apply
    pub failed: Vec<ItemFailure>,
}

impl UpdateReport {
    /// Fold another report into this one.
    pub fn absorb(&mut self, other: UpdateReport) {
        self.created.extend(other.created);
        self.updated.extend(other.updated);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }

    /// Number of items successfully applied.
    pub fn applied(&self) -> usize {
        self.created.len() + self.updated.len()
    }

    /// Whether every item applied cleanly.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Orchestrates applying changelists and re-snapshotting
pub struct SyncManager {
    registry: Arc<dyn ExtensionRegistry>,
    lister: Arc<Lister>,
    snapshotter: Arc<Snapshotter>,
    reverter: Arc<dyn ConfigReverter>,
    install: Arc<dyn ConfigStore>,
    stores: SyncStores,
    resolver: EntityTypeResolver,
    mode: UpdateMode,
    error_policy: ErrorPolicy,
}

impl SyncManager {
    /// Create a manager.
    ///
    /// `install` is the store the reverter imports from; it is also the
    /// source of the current upstream copy when merging.
    pub fn new(
        registry: Arc<dyn ExtensionRegistry>,
        lister: Arc<Lister>,
        snapshotter: Arc<Snapshotter>,
        reverter: Arc<dyn ConfigReverter>,
        install: Arc<dyn ConfigStore>,
        stores: SyncStores,
    ) -> Self {
        Self {
            registry,
            lister,
            snapshotter,
            reverter,
            install,
            stores,
            resolver: EntityTypeResolver::default(),
            mode: UpdateMode::default(),
            error_policy: ErrorPolicy::default(),
        }
    }

    pub fn with_mode(mut self, mode: UpdateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_resolver(mut self, resolver: EntityTypeResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    /// Apply the pending changes of every installed extension.
    pub fn update_all(&self, safe_only: bool) -> Result<UpdateReport> {
        let full = self.lister.get_full_changelist(safe_only)?;
        let mut report = UpdateReport::default();
        for (extension_type, name, changelist) in full.iter() {
            let extension_report =
                self.update_extension(extension_type, name, Some(changelist.clone()), safe_only)?;
            report.absorb(extension_report);
        }
        info!(
            "Synchronized configuration: {} created, {} updated, {} skipped, {} failed",
            report.created.len(),
            report.updated.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Apply changes for one extension, then re-snapshot it.
    ///
    /// When `changelist` is `None` the pending changes are listed first,
    /// honoring `safe_only`.
    pub fn update_extension(
        &self,
        extension_type: ExtensionType,
        name: &str,
        changelist: Option<Changelist>,
        safe_only: bool,
    ) -> Result<UpdateReport> {
        self.require_installed(extension_type, name)?;

        let changelist = match changelist {
            Some(changelist) => changelist,
            None => self
                .lister
                .get_extension_changelist(extension_type, name, safe_only)?,
        };

        let mut report = UpdateReport::default();
        let applied = self.apply(&changelist, &mut report);

        let snapshot = self
            .snapshotter
            .create_extension_snapshot(extension_type, name);
        self.lister.reset();

        applied?;
        snapshot?;
        debug!(
            "{} {}: {} applied, {} failed",
            extension_type,
            name,
            report.applied(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Apply a partial changelist for one extension.
    ///
    /// Only the items that were created, updated or skipped are
    /// re-snapshotted, so every other pending change of the extension stays
    /// pending.
    pub fn update_items(
        &self,
        extension_type: ExtensionType,
        name: &str,
        changelist: &Changelist,
    ) -> Result<UpdateReport> {
        self.require_installed(extension_type, name)?;

        let mut report = UpdateReport::default();
        let applied = self.apply(changelist, &mut report);

        let done: Vec<String> = report
            .created
            .iter()
            .chain(&report.updated)
            .chain(&report.skipped)
            .cloned()
            .collect();
        let snapshot = self
            .snapshotter
            .create_items_snapshot(extension_type, name, &done);
        self.lister.reset();

        applied?;
        snapshot?;
        debug!(
            "{} {}: {} of {} selected item(s) applied",
            extension_type,
            name,
            report.applied(),
            changelist.len()
        );
        Ok(report)
    }

    fn require_installed(&self, extension_type: ExtensionType, name: &str) -> Result<()> {
        if self.registry.is_installed(extension_type, name) {
            return Ok(());
        }
        Err(Error::UnknownExtension {
            extension_type: extension_type.to_string(),
            name: name.to_string(),
        })
    }

    /// The value an update would give an item, without writing it.
    ///
    /// Returns `None` when the item is not provided by any extension.
    pub fn preview_update(&self, name: &str) -> Result<Option<Document>> {
        let Some(current) = self.install.read(name)? else {
            return Ok(None);
        };
        if self.mode == UpdateMode::Revert {
            return Ok(Some(current));
        }
        let Some(active) = self.active_copy(name)? else {
            return Ok(Some(current));
        };
        Ok(Some(self.merged(name, &current, &active)?.unwrap_or(current)))
    }

    fn apply(&self, changelist: &Changelist, report: &mut UpdateReport) -> Result<()> {
        for kind in [ChangeKind::Create, ChangeKind::Update] {
            for item in changelist.get(kind) {
                let entity_type = self.resolver.resolve(item);
                if kind == ChangeKind::Create && self.active_copy(item)?.is_some() {
                    info!("Skipped {} of {}: already in the active configuration", kind, item);
                    report.skipped.push(item.clone());
                    continue;
                }
                let result = match kind {
                    ChangeKind::Create => self.reverter.import(entity_type, item),
                    _ => self.apply_update(entity_type, item),
                };

                match result {
                    Ok(()) => {
                        info!("Applied {} of {} ({})", kind, item, entity_type);
                        match kind {
                            ChangeKind::Create => report.created.push(item.clone()),
                            _ => report.updated.push(item.clone()),
                        }
                    }
                    Err(err) => {
                        warn!("Failed to apply {} of {}: {}", kind, item, err);
                        report.failed.push(ItemFailure {
                            name: item.clone(),
                            kind,
                            message: err.to_string(),
                        });
                        if self.error_policy == ErrorPolicy::Abort {
                            return Err(err);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn apply_update(&self, entity_type: &str, name: &str) -> Result<()> {
        if self.mode == UpdateMode::Revert {
            return self.reverter.revert(entity_type, name);
        }

        let Some(active) = self.active_copy(name)? else {
            return Err(Error::Revert {
                entity_type: entity_type.to_string(),
                name: name.to_string(),
                message: "not in the active configuration".to_string(),
            });
        };
        let merged = match self.install.read(name)? {
            Some(current) => self.merged(name, &current, &active)?,
            None => None,
        };
        match merged {
            Some(merged) => self.stores.active.write(name, &merged),
            None => {
                debug!("No merge base for {}, reverting", name);
                self.reverter.revert(entity_type, name)
            }
        }
    }

    fn active_copy(&self, name: &str) -> Result<Option<Document>> {
        Ok(self
            .stores
            .active
            .read(name)?
            .filter(|doc| !document::is_absent(doc)))
    }

    /// Three-way merge of `current` into the `active` copy of `name`.
    ///
    /// `None` when there is no previous snapshot.
    fn merged(&self, name: &str, current: &Document, active: &Document) -> Result<Option<Document>> {
        let previous = self
            .stores
            .snapshot_extension
            .read(name)?
            .filter(|doc| !document::is_absent(doc));

        let Some(previous) = previous else {
            return Ok(None);
        };
        if document::shape(active) == document::Shape::Scalar
            && document::shape(current) != document::Shape::Scalar
        {
            return Err(Error::Merge {
                name: name.to_string(),
                message: format!(
                    "active copy is a {}, expected a document",
                    document::type_name(active)
                ),
            });
        }
        Ok(Some(merge(&previous, current, active)))
    }
}
