//! Integration tests for synchronizing a site on disk
//!
//! These tests drive the library through [`Site`], with every store backed
//! by YAML files in a temporary directory:
//! - initial import of shipped configuration
//! - safe updates merged into active configuration
//! - customized items held back unless all changes are requested
//! - install profile overrides
//! - revert mode

mod common;

use common::prelude::*;
use config_sync::comparer::ChangeKind;
use config_sync::extension::ExtensionType;
use config_sync::site::Site;

const PAGE: &str = "uuid: 1111\ntype: page\nname: Basic page\ndisplay_submitted: true\n";
const PAGE_RENAMED: &str = "uuid: 1111\ntype: page\nname: Page\ndisplay_submitted: true\n";

fn yaml(s: &str) -> serde_yaml::Value {
    serde_yaml::from_str(s).unwrap()
}

fn single_module_site(manifest: &str) -> SiteFixture {
    SiteFixture::new()
        .with_manifest(manifest)
        .with_install("modules/node", "node.type.page", PAGE)
}

/// Import everything once so later tests start from a synchronized site.
fn synchronized(fixture: &SiteFixture) -> Site {
    let site = Site::from_file(fixture.manifest_path()).unwrap();
    let report = site.manager.update_all(true).unwrap();
    assert!(report.is_success(), "initial import failed: {:?}", report.failed);
    site
}

#[test]
fn test_initial_update_imports_and_snapshots() {
    let fixture = single_module_site(manifests::SINGLE_MODULE);
    let site = synchronized(&fixture);

    assert_eq!(fixture.active("node.type.page"), Some(yaml(PAGE)));
    assert!(site.has_snapshot().unwrap());
    assert!(site.lister.get_full_changelist(false).unwrap().is_empty());
}

#[test]
fn test_upstream_change_is_merged() {
    let fixture = single_module_site(manifests::SINGLE_MODULE);
    let site = synchronized(&fixture);

    fixture.write("modules/node/config/install/node.type.page.yml", PAGE_RENAMED);

    let changes = site.lister.get_full_changelist(true).unwrap();
    let node = changes.get(ExtensionType::Module, "node").unwrap();
    assert_eq!(node.get(ChangeKind::Update), ["node.type.page"]);

    let report = site.manager.update_all(true).unwrap();
    assert_eq!(report.updated, vec!["node.type.page"]);
    assert_eq!(fixture.active("node.type.page"), Some(yaml(PAGE_RENAMED)));
    assert!(site.lister.get_full_changelist(true).unwrap().is_empty());
}

#[test]
fn test_customized_item_is_not_safe() {
    let fixture = single_module_site(manifests::SINGLE_MODULE);
    let site = synchronized(&fixture);

    fixture.write(
        "config/active/node.type.page.yml",
        "uuid: 1111\ntype: page\nname: Basic page\ndisplay_submitted: false\n",
    );
    fixture.write("modules/node/config/install/node.type.page.yml", PAGE_RENAMED);

    assert!(site.lister.get_full_changelist(true).unwrap().is_empty());
    let all = site.lister.get_full_changelist(false).unwrap();
    assert_eq!(all.count(), 1);

    let report = site
        .manager
        .update_extension(ExtensionType::Module, "node", None, false)
        .unwrap();
    assert_eq!(report.updated, vec!["node.type.page"]);

    // Upstream rename applied, site customization kept
    assert_eq!(
        fixture.active("node.type.page"),
        Some(yaml(
            "uuid: 1111\ntype: page\nname: Page\ndisplay_submitted: false\n"
        ))
    );
}

#[test]
fn test_revert_mode_overwrites_customization() {
    let fixture = single_module_site(manifests::REVERT_MODE);
    let site = synchronized(&fixture);

    fixture.write(
        "config/active/node.type.page.yml",
        "uuid: 2222\ntype: page\nname: Basic page\ndisplay_submitted: false\n",
    );
    fixture.write("modules/node/config/install/node.type.page.yml", PAGE_RENAMED);

    site.manager
        .update_extension(ExtensionType::Module, "node", None, false)
        .unwrap();

    assert_eq!(
        fixture.active("node.type.page"),
        Some(yaml("uuid: 2222\ntype: page\nname: Page\ndisplay_submitted: true\n"))
    );
}

#[test]
fn test_profile_overrides_module_updates() {
    let fixture = SiteFixture::new().with_standard_site();
    let site = synchronized(&fixture);

    fixture.write(
        "modules/node/config/install/node.settings.yml",
        "use_admin_theme: false\nitems_per_page: 10\n",
    );

    let node = site
        .lister
        .get_extension_changelist(ExtensionType::Module, "node", false)
        .unwrap();
    assert!(node.is_empty());

    fixture.write(
        "profiles/standard/config/install/node.settings.yml",
        "use_admin_theme: false\n",
    );
    let profile = site
        .lister
        .get_extension_changelist(ExtensionType::Module, "standard", true)
        .unwrap();
    assert_eq!(profile.get(ChangeKind::Update), ["node.settings"]);
}

#[test]
fn test_new_item_deleted_by_site_is_not_safe() {
    let fixture = single_module_site(manifests::SINGLE_MODULE);
    let site = synchronized(&fixture);

    // The site had views.view.frontpage at the last snapshot and removed it
    fixture.write(
        ".config-sync/snapshot/active/views.view.frontpage.yml",
        "id: frontpage\n",
    );
    fixture.write(
        "modules/node/config/install/views.view.frontpage.yml",
        "id: frontpage\nlabel: Frontpage\n",
    );

    let safe = site
        .lister
        .get_extension_changelist(ExtensionType::Module, "node", true)
        .unwrap();
    assert!(safe.is_empty());

    let all = site
        .lister
        .get_extension_changelist(ExtensionType::Module, "node", false)
        .unwrap();
    assert_eq!(all.get(ChangeKind::Create), ["views.view.frontpage"]);
}

#[test]
fn test_item_removed_upstream_is_left_alone() {
    let fixture = single_module_site(manifests::SINGLE_MODULE);
    let site = synchronized(&fixture);

    fixture.remove_install("modules/node", "node.type.page");

    assert!(site.lister.get_full_changelist(false).unwrap().is_empty());
    site.manager.update_all(false).unwrap();
    assert_eq!(fixture.active("node.type.page"), Some(yaml(PAGE)));
}

#[test]
fn test_preview_does_not_write() {
    let fixture = single_module_site(manifests::SINGLE_MODULE);
    let site = synchronized(&fixture);

    fixture.write("modules/node/config/install/node.type.page.yml", PAGE_RENAMED);

    let preview = site.manager.preview_update("node.type.page").unwrap();
    assert_eq!(preview, Some(yaml(PAGE_RENAMED)));
    assert_eq!(fixture.active("node.type.page"), Some(yaml(PAGE)));
    assert_eq!(site.manager.preview_update("missing.item").unwrap(), None);
}
