//! # Diff Command Implementation
//!
//! Explains what an update would do to a single configuration item:
//!
//! - which extension provides it and which entity type it belongs to;
//! - what changed upstream since the last snapshot (extension copy);
//! - what the site customized since the last snapshot (active copy);
//! - the value the update would write.
//!
//! This command is read-only.

use anyhow::Result;
use clap::Args;

use super::{open_site, Context};
use config_sync::diff::ConfigDiff;
use config_sync::document::{self, Document};
use config_sync::output::{emoji, OutputConfig};
use config_sync::store::ConfigStore;
use config_sync::suggestions;

/// Show how an update would change one configuration item
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Name of the configuration item (e.g. node.type.page)
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// Execute the `diff` command.
pub fn execute(args: DiffArgs, context: &Context) -> Result<()> {
    let out = &context.out;
    let site = open_site(&context.config_path)?;
    let name = args.name.as_str();

    let Some((extension_type, extension)) = site.install.provider(name)? else {
        return Err(suggestions::item_not_provided(name));
    };

    println!("{} {}", emoji(out, "📄", "[ITEM]"), name);
    println!("  Provided by: {} {}", extension_type, extension);
    println!("  Entity type: {}", site.resolver.resolve(name));

    let install = site.install.read(name)?;
    let snapshot_extension = site.stores.snapshot_extension.read(name)?;
    let active = site.stores.active.read(name)?;
    let snapshot_active = site.stores.snapshot_active.read(name)?;

    println!();
    print_changes(
        out,
        "Upstream changes",
        snapshot_extension.as_ref(),
        install.as_ref(),
        site.lister.differ(),
    );
    print_changes(
        out,
        "Site customizations",
        snapshot_active.as_ref(),
        active.as_ref(),
        site.lister.differ(),
    );

    if let Some(preview) = site.manager.preview_update(name)? {
        println!(
            "\n{} Value after update ({} mode):",
            emoji(out, "🔀", "[RESULT]"),
            site.manager.mode()
        );
        print!("{}", indent(&document::to_yaml(&preview)?));
    }
    Ok(())
}

fn print_changes(
    out: &OutputConfig,
    title: &str,
    before: Option<&Document>,
    after: Option<&Document>,
    differ: &ConfigDiff,
) {
    let before = before.filter(|doc| !document::is_absent(doc));
    let after = after.filter(|doc| !document::is_absent(doc));
    match (before, after) {
        (None, None) => println!("  {}: not recorded", title),
        (None, Some(_)) => println!("  {}: new since last snapshot", title),
        (Some(_), None) => println!("  {}: removed since last snapshot", title),
        (Some(before), Some(after)) => {
            let paths = differ.changed_paths(before, after);
            if paths.is_empty() {
                println!("  {}: none", title);
            } else {
                println!("  {}:", title);
                for path in paths {
                    println!("    {} {}", emoji(out, "✏️ ", "~"), path);
                }
            }
        }
    }
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("  {}\n", line)).collect()
}
