//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a site fixture on disk and helpers to run the
//! `config-sync` binary against it.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = SiteFixture::new().with_standard_site();
//!     fixture.command().arg("status").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::SiteFixture;
}

/// Common manifest snippets for testing.
#[allow(dead_code)]
pub mod manifests {
    /// A site with a profile, two modules and a theme.
    pub const STANDARD: &str = r#"
active: config/active
profile: standard
modules:
  standard: profiles/standard
  node: modules/node
  views: modules/views
themes:
  olivero: themes/olivero
"#;

    /// A site with a single module.
    pub const SINGLE_MODULE: &str = r#"
active: config/active
modules:
  node: modules/node
"#;

    /// A site replacing updated items instead of merging them.
    pub const REVERT_MODE: &str = r#"
active: config/active
update_mode: revert
modules:
  node: modules/node
"#;

    /// A manifest with an unknown field.
    pub const UNKNOWN_FIELD: &str = r#"
active: config/active
moduels:
  node: modules/node
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "active: [config";
}

/// A temporary site directory: a manifest, an active configuration
/// directory and extension install directories.
pub struct SiteFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl SiteFixture {
    /// Create a fixture with an empty active directory and no manifest.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("config/active")
            .create_dir_all()
            .expect("Failed to create active directory");
        Self { temp_dir }
    }

    /// Write `config-sync.yaml` with the given content.
    pub fn with_manifest(self, content: &str) -> Self {
        self.with_file("config-sync.yaml", content)
    }

    /// The standard site: profile `standard`, modules `node` and `views`,
    /// theme `olivero`, with some configuration already active.
    pub fn with_standard_site(self) -> Self {
        self.with_manifest(manifests::STANDARD)
            .with_install("profiles/standard", "system.site", "name: Standard site\npage:\n  front: /node\n")
            .with_install("profiles/standard", "node.settings", "use_admin_theme: true\n")
            .with_install("modules/node", "node.settings", "use_admin_theme: false\n")
            .with_install("modules/node", "node.type.page", "uuid: 1111\ntype: page\nname: Basic page\n")
            .with_install("modules/views", "views.view.content", "id: content\nlabel: Content\n")
            .with_install("themes/olivero", "olivero.settings", "logo: true\n")
            .with_active("system.site", "name: My site\npage:\n  front: /node\n")
            .with_active("node.settings", "use_admin_theme: true\n")
    }

    /// Ship an item in the install configuration of the extension at `root`.
    pub fn with_install(self, root: &str, name: &str, content: &str) -> Self {
        self.with_file(&format!("{}/config/install/{}.yml", root, name), content)
    }

    /// Remove an item from the install configuration of the extension at `root`.
    pub fn remove_install(&self, root: &str, name: &str) {
        let path = self
            .path()
            .join(format!("{}/config/install/{}.yml", root, name));
        std::fs::remove_file(path).expect("Failed to remove install item");
    }

    /// Write an item to the active configuration.
    pub fn with_active(self, name: &str, content: &str) -> Self {
        self.with_file(&format!("config/active/{}.yml", name), content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.write(path, content);
        self
    }

    /// Overwrite a file after the fixture was built.
    pub fn write(&self, path: &str, content: &str) {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
    }

    /// Read an active item, or `None` when it does not exist.
    pub fn active(&self, name: &str) -> Option<serde_yaml::Value> {
        let path = self.path().join(format!("config/active/{}.yml", name));
        let content = std::fs::read_to_string(path).ok()?;
        Some(serde_yaml::from_str(&content).expect("Active item should be valid YAML"))
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.path().join("config-sync.yaml")
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("config-sync");
        cmd.current_dir(self.path())
            .env_remove("CONFIG_SYNC_CONFIG")
            .env("NO_COLOR", "1");
        cmd
    }

    /// Create a command with the manifest path argument.
    pub fn command_with_config(&self) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.arg("--config").arg(self.manifest_path());
        cmd
    }
}

impl Default for SiteFixture {
    fn default() -> Self {
        Self::new()
    }
}
