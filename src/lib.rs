//! # Configuration Synchronization Library
//!
//! This library keeps a site's active configuration in step with the default
//! configuration its installed extensions (modules and themes) ship, without
//! clobbering what the site administrator customized. It is designed to be
//! used by the `config-sync` command-line tool but can also be embedded in
//! other applications through its store and registry traits.
//!
//! ## Quick Example
//!
//! ```
//! use std::sync::Arc;
//! use config_sync::comparer::ChangeKind;
//! use config_sync::diff::ConfigDiff;
//! use config_sync::extension::{ExtensionType, MemoryRegistry};
//! use config_sync::lister::Lister;
//! use config_sync::snapshot::Snapshotter;
//! use config_sync::store::{ConfigStore, MemoryStore, SyncStores};
//!
//! let node = Arc::new(MemoryStore::new("node"));
//! node.write("node.settings", &serde_yaml::from_str("preview: true").unwrap()).unwrap();
//!
//! let mut registry = MemoryRegistry::new();
//! registry.add(ExtensionType::Module, "node", node.clone());
//! let registry = Arc::new(registry);
//!
//! let stores = SyncStores::in_memory();
//! Snapshotter::new(registry.clone(), stores.clone()).create_full_snapshot().unwrap();
//!
//! // The extension ships a new item after the snapshot
//! node.write("node.type.page", &serde_yaml::from_str("name: Page").unwrap()).unwrap();
//!
//! let lister = Lister::new(registry, stores, ConfigDiff::default());
//! let changes = lister.get_extension_changelist(ExtensionType::Module, "node", true).unwrap();
//! assert_eq!(changes.get(ChangeKind::Create), ["node.type.page"]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Stores (`store`)**: named configuration documents behind the
//!   `ConfigStore` trait: the active configuration, two snapshot stores and
//!   the read-only install configuration of every extension.
//! - **Differ (`diff`)**: structural comparison that ignores volatile
//!   identity keys and mapping key order.
//! - **Comparer (`comparer`)**: create/update/delete/rename changelists
//!   between two stores, in dependency order.
//! - **Snapshots (`snapshot`)**: what extensions shipped and what the site
//!   had at the last synchronization.
//! - **Lister (`lister`)**: pending changes per extension, optionally pruned
//!   to the safe ones.
//! - **Merger (`merge`)**: three-way structural merge of upstream changes into
//!   the site's copy.
//! - **Manager (`manager`)**: applies changelists and re-snapshots.
//!
//! ## Execution Flow
//!
//! 1.  **Snapshot**: record extension-provided and active configuration.
//! 2.  **List**: compare each extension's install configuration with the
//!     snapshot, dropping anything the site touched since.
//! 3.  **Apply**: import new items, merge or revert updated ones.
//! 4.  **Re-snapshot**: the applied state becomes the next baseline.

pub mod comparer;
pub mod config;
pub mod defaults;
pub mod diff;
pub mod document;
pub mod entity;
pub mod error;
pub mod extension;
pub mod lister;
pub mod manager;
pub mod merge;
pub mod output;
pub mod revert;
pub mod site;
pub mod snapshot;
pub mod store;
pub mod suggestions;

#[cfg(test)]
mod merge_proptest;
