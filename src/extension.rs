//! # Installed Extensions
//!
//! Extensions (modules and themes) ship default configuration in their
//! `config/install` directory. The synchronization engine never discovers
//! extensions on its own: it is handed an [`ExtensionRegistry`] that
//! enumerates what is installed and where each extension's install-time
//! configuration lives.
//!
//! Two registries are provided:
//!
//! - [`SiteRegistry`]: extensions located on disk, as declared in the site
//!   manifest.
//! - [`MemoryRegistry`]: extensions whose install configuration is held in
//!   arbitrary stores, used by tests and embedders.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{ConfigStore, FileStore};

/// Directory, relative to an extension root, holding install-time configuration.
pub const CONFIG_INSTALL_DIRECTORY: &str = "config/install";

/// Kind of installable extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionType {
    /// A module (install profiles are modules too)
    Module,
    /// A theme
    Theme,
}

impl ExtensionType {
    /// All extension types, in the order they are processed.
    pub const ALL: [ExtensionType; 2] = [ExtensionType::Module, ExtensionType::Theme];

    /// Machine name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionType::Module => "module",
            ExtensionType::Theme => "theme",
        }
    }
}

impl fmt::Display for ExtensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtensionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "module" | "profile" => Ok(ExtensionType::Module),
            "theme" => Ok(ExtensionType::Theme),
            other => Err(Error::ConfigParse {
                message: format!("Unknown extension type '{}'", other),
                hint: Some("Use 'module' or 'theme'".to_string()),
            }),
        }
    }
}

/// Parse an extension reference of the form `type:name` (e.g. `module:node`).
///
/// A bare name is taken to be a module.
pub fn parse_extension_ref(reference: &str) -> Result<(ExtensionType, String)> {
    let (extension_type, name) = match reference.split_once(':') {
        Some((extension_type, name)) => (extension_type.parse()?, name.trim()),
        None => (ExtensionType::Module, reference.trim()),
    };
    if name.is_empty() {
        return Err(Error::ConfigParse {
            message: format!("Missing extension name in '{}'", reference),
            hint: Some("Use the form type:name, e.g. module:node".to_string()),
        });
    }
    Ok((extension_type, name.to_string()))
}

/// Trait for enumerating installed extensions - allows mocking in tests
pub trait ExtensionRegistry: Send + Sync {
    /// Machine names of the installed extensions of a type, in processing order.
    fn list_installed(&self, extension_type: ExtensionType) -> Vec<String>;

    /// The install-time configuration directory of an extension, if it has one.
    fn install_config_dir(&self, extension_type: ExtensionType, name: &str) -> Option<PathBuf>;

    /// Machine name of the install profile, if the site has one.
    fn install_profile(&self) -> Option<String>;

    /// Whether an extension is installed.
    fn is_installed(&self, extension_type: ExtensionType, name: &str) -> bool {
        self.list_installed(extension_type)
            .iter()
            .any(|installed| installed == name)
    }

    /// A read-only store over an extension's install-time configuration.
    ///
    /// Returns `None` when the extension ships no install configuration,
    /// which callers treat as "nothing to offer" rather than an error.
    fn install_storage(
        &self,
        extension_type: ExtensionType,
        name: &str,
    ) -> Option<Arc<dyn ConfigStore>> {
        let dir = self.install_config_dir(extension_type, name)?;
        if !dir.is_dir() {
            return None;
        }
        Some(Arc::new(FileStore::read_only(
            &format!("{} {} install", extension_type, name),
            dir,
        )))
    }
}

/// Extensions located on disk, keyed by machine name
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    modules: BTreeMap<String, PathBuf>,
    themes: BTreeMap<String, PathBuf>,
    profile: Option<String>,
}

impl SiteRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an installed extension rooted at `root`
    pub fn add<P: AsRef<Path>>(&mut self, extension_type: ExtensionType, name: &str, root: P) {
        let root = root.as_ref().to_path_buf();
        match extension_type {
            ExtensionType::Module => self.modules.insert(name.to_string(), root),
            ExtensionType::Theme => self.themes.insert(name.to_string(), root),
        };
    }

    /// Set the install profile
    pub fn set_profile(&mut self, profile: Option<String>) {
        self.profile = profile;
    }

    /// Root directory of an installed extension
    pub fn root(&self, extension_type: ExtensionType, name: &str) -> Option<&Path> {
        let roots = match extension_type {
            ExtensionType::Module => &self.modules,
            ExtensionType::Theme => &self.themes,
        };
        roots.get(name).map(PathBuf::as_path)
    }
}

impl ExtensionRegistry for SiteRegistry {
    fn list_installed(&self, extension_type: ExtensionType) -> Vec<String> {
        match extension_type {
            ExtensionType::Module => self.modules.keys().cloned().collect(),
            ExtensionType::Theme => self.themes.keys().cloned().collect(),
        }
    }

    fn install_config_dir(&self, extension_type: ExtensionType, name: &str) -> Option<PathBuf> {
        let dir = self
            .root(extension_type, name)?
            .join(CONFIG_INSTALL_DIRECTORY);
        dir.is_dir().then_some(dir)
    }

    fn install_profile(&self) -> Option<String> {
        self.profile.clone()
    }
}

/// Extensions whose install configuration lives in arbitrary stores
#[derive(Default)]
pub struct MemoryRegistry {
    extensions: BTreeMap<(ExtensionType, String), Option<Arc<dyn ConfigStore>>>,
    profile: Option<String>,
}

impl MemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension with the store holding its install configuration
    pub fn add(
        &mut self,
        extension_type: ExtensionType,
        name: &str,
        install: Arc<dyn ConfigStore>,
    ) -> &mut Self {
        self.extensions
            .insert((extension_type, name.to_string()), Some(install));
        self
    }

    /// Register an extension that ships no install configuration
    pub fn add_without_config(&mut self, extension_type: ExtensionType, name: &str) -> &mut Self {
        self.extensions
            .insert((extension_type, name.to_string()), None);
        self
    }

    /// Set the install profile
    pub fn set_profile(&mut self, profile: &str) -> &mut Self {
        self.profile = Some(profile.to_string());
        self
    }
}

impl ExtensionRegistry for MemoryRegistry {
    fn list_installed(&self, extension_type: ExtensionType) -> Vec<String> {
        self.extensions
            .keys()
            .filter(|(kind, _)| *kind == extension_type)
            .map(|(_, name)| name.clone())
            .collect()
    }

    fn install_config_dir(&self, _extension_type: ExtensionType, _name: &str) -> Option<PathBuf> {
        None
    }

    fn install_profile(&self) -> Option<String> {
        self.profile.clone()
    }

    fn install_storage(
        &self,
        extension_type: ExtensionType,
        name: &str,
    ) -> Option<Arc<dyn ConfigStore>> {
        self.extensions
            .get(&(extension_type, name.to_string()))
            .cloned()
            .flatten()
    }
}
