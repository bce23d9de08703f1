//! Default values for config-sync.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

pub use crate::config::DEFAULT_MANIFEST as DEFAULT_CONFIG_FILENAME;

/// Environment variable overriding the manifest location.
pub const CONFIG_ENV_VAR: &str = "CONFIG_SYNC_CONFIG";

/// Returns the manifest path used when no `--config` flag is given.
///
/// Reads `CONFIG_SYNC_CONFIG`, falling back to `config-sync.yaml` in the
/// current directory. An empty variable counts as unset.
pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_filename() {
        assert_eq!(DEFAULT_CONFIG_FILENAME, "config-sync.yaml");
    }

    #[test]
    fn test_default_config_path_is_manifest_or_override() {
        let path = default_config_path();
        match std::env::var_os(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
            Some(value) => assert_eq!(path, PathBuf::from(value)),
            None => assert_eq!(path, PathBuf::from(DEFAULT_CONFIG_FILENAME)),
        }
    }
}
