//! # Site Manifest
//!
//! This module defines the `config-sync.yaml` manifest describing a site: where
//! its active configuration lives, where snapshots are kept, which extensions
//! are installed and how synchronization behaves.
//!
//! ```yaml
//! active: config/active
//! snapshot: config/snapshot
//! profile: standard
//! update_mode: merge
//! modules:
//!   node: modules/node
//!   standard: profiles/standard
//! themes:
//!   olivero: themes/olivero
//! ```
//!
//! Relative paths are resolved against the directory holding the manifest.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::comparer::ReadFailurePolicy;
use crate::diff::DEFAULT_IGNORE_KEYS;
use crate::error::{Error, Result};
use crate::manager::{ErrorPolicy, UpdateMode};

/// Default manifest file name.
pub const DEFAULT_MANIFEST: &str = "config-sync.yaml";

/// Extension machine names: lowercase letters, digits and underscores.
const MACHINE_NAME_PATTERN: &str = r"^[a-z][a-z0-9_]*$";

/// Default snapshot directory, relative to the manifest.
pub const DEFAULT_SNAPSHOT_DIR: &str = ".config-sync/snapshot";

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SNAPSHOT_DIR)
}

fn default_ignore_keys() -> Vec<String> {
    DEFAULT_IGNORE_KEYS.iter().map(|key| key.to_string()).collect()
}

/// A parsed site manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory holding the active configuration
    pub active: PathBuf,

    /// Directory holding the `extension` and `active` snapshot stores
    #[serde(default = "default_snapshot_dir")]
    pub snapshot: PathBuf,

    /// Machine name of the install profile (must be listed under `modules`)
    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default)]
    pub update_mode: UpdateMode,

    #[serde(default)]
    pub on_error: ErrorPolicy,

    #[serde(default)]
    pub on_read_error: ReadFailurePolicy,

    /// Top-level keys ignored when comparing documents
    #[serde(default = "default_ignore_keys")]
    pub ignore_keys: Vec<String>,

    /// Installed modules: machine name to extension root
    #[serde(default)]
    pub modules: BTreeMap<String, PathBuf>,

    /// Installed themes: machine name to extension root
    #[serde(default)]
    pub themes: BTreeMap<String, PathBuf>,

    /// Additional configuration name prefixes of entity types
    #[serde(default)]
    pub entity_types: BTreeMap<String, String>,

    /// Directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl SiteConfig {
    /// Resolve a manifest path against the manifest directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Absolute location of the active configuration.
    pub fn active_dir(&self) -> PathBuf {
        self.resolve(&self.active)
    }

    /// Absolute location of the snapshot stores.
    pub fn snapshot_dir(&self) -> PathBuf {
        self.resolve(&self.snapshot)
    }

    fn validate(&self) -> Result<()> {
        if self.active.as_os_str().is_empty() {
            return Err(Error::ConfigParse {
                message: "'active' must not be empty".to_string(),
                hint: Some("Point 'active' at the directory of active configuration".to_string()),
            });
        }

        let machine_name = Regex::new(MACHINE_NAME_PATTERN)?;
        for name in self.modules.keys().chain(self.themes.keys()) {
            if !machine_name.is_match(name) {
                return Err(Error::ConfigParse {
                    message: format!("Invalid extension machine name '{}'", name),
                    hint: Some(
                        "Machine names start with a letter and contain only a-z, 0-9 and _"
                            .to_string(),
                    ),
                });
            }
        }

        if let Some(profile) = &self.profile {
            if !self.modules.contains_key(profile) {
                return Err(Error::ConfigParse {
                    message: format!("Install profile '{}' is not listed under modules", profile),
                    hint: Some(format!("Add '{}: <path>' to 'modules'", profile)),
                });
            }
        }

        for prefix in self.entity_types.keys() {
            if !prefix.ends_with('.') {
                return Err(Error::ConfigParse {
                    message: format!("Entity type prefix '{}' must end with '.'", prefix),
                    hint: None,
                });
            }
        }
        Ok(())
    }
}

/// Parse and validate a manifest. Relative paths stay relative to the
/// current directory.
pub fn parse(yaml_content: &str) -> Result<SiteConfig> {
    let config: SiteConfig = serde_yaml::from_str(yaml_content).map_err(|err| {
        let message = err.to_string();
        let hint = if message.contains("missing field `active`") {
            Some("Add 'active: <dir>' pointing at the active configuration".to_string())
        } else if message.contains("unknown field") {
            Some(
                "Known keys: active, snapshot, profile, update_mode, on_error, on_read_error, \
                 ignore_keys, modules, themes, entity_types"
                    .to_string(),
            )
        } else {
            None
        };
        Error::ConfigParse { message, hint }
    })?;
    config.validate()?;
    Ok(config)
}

/// Load a manifest from a file, resolving paths against its directory.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    let mut config = parse(&content)?;
    config.base_dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(config)
}
