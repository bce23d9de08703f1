//! # CLI Command Implementations
//!
//! Each subcommand of the `config-sync` tool lives in its own file with:
//! - an `Args` struct defining its arguments, derived using `clap`;
//! - an `execute` function that opens the site and calls into the
//!   `config_sync` library.
//!
//! Helpers shared by several commands are defined here.

pub mod completions;
pub mod diff;
pub mod snapshot;
pub mod status;
pub mod update;

use std::path::{Path, PathBuf};

use anyhow::Result;

use config_sync::extension::{parse_extension_ref, ExtensionType};
use config_sync::lister::FullChangelist;
use config_sync::output::OutputConfig;
use config_sync::site::Site;
use config_sync::suggestions;

/// Settings shared by every command
#[derive(Debug)]
pub struct Context {
    pub config_path: PathBuf,
    pub out: OutputConfig,
}

/// Open the site described by the manifest at `config_path`.
pub fn open_site(config_path: &Path) -> Result<Site> {
    if !config_path.exists() {
        return Err(suggestions::config_not_found(config_path));
    }
    Site::from_file(config_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load site from {}: {}",
            config_path.display(),
            e
        )
    })
}

/// Resolve a `type:name` reference to an installed extension.
pub fn resolve_extension(site: &Site, reference: &str) -> Result<(ExtensionType, String)> {
    let (extension_type, name) = parse_extension_ref(reference)?;
    if site.require_extension(extension_type, &name).is_err() {
        let installed = site.registry.list_installed(extension_type);
        return Err(suggestions::unknown_extension(extension_type, &name, &installed));
    }
    Ok((extension_type, name))
}

/// Pending changes for one extension or the whole site, optionally limited to
/// item names matching a glob pattern.
pub fn pending_changes(
    site: &Site,
    extension: Option<&str>,
    safe_only: bool,
    only: Option<&str>,
) -> Result<FullChangelist> {
    let full = match extension {
        Some(reference) => {
            let (extension_type, name) = resolve_extension(site, reference)?;
            let changelist = site
                .lister
                .get_extension_changelist(extension_type, &name, safe_only)?;
            let mut full = FullChangelist::new();
            full.insert(extension_type, &name, changelist);
            full
        }
        None => site.lister.get_full_changelist(safe_only)?,
    };

    let Some(pattern) = only else {
        return Ok(full);
    };
    if let Err(e) = glob::Pattern::new(pattern) {
        return Err(suggestions::invalid_glob(pattern, &e));
    }
    let mut filtered = FullChangelist::new();
    for (extension_type, name, changelist) in full.iter() {
        filtered.insert(extension_type, name, changelist.matching(pattern)?);
    }
    Ok(filtered)
}
