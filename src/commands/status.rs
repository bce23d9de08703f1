//! # Status Command Implementation
//!
//! Lists the configuration changes installed extensions would bring, as a
//! tree grouped by extension and change kind, or as JSON.
//!
//! By default only safe changes are listed: items the site customized or
//! removed since the last snapshot are left out. `--all` lists them too.
//!
//! This command is read-only.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeBuilder};

use super::{open_site, pending_changes, Context};
use config_sync::lister::FullChangelist;
use config_sync::output::{change_label, emoji, OutputConfig};

/// List pending configuration changes
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Include changes that would overwrite site customizations
    #[arg(long)]
    pub all: bool,

    /// Print the changes as JSON
    #[arg(long)]
    pub json: bool,

    /// Only list changes of one extension (type:name, e.g. theme:olivero)
    #[arg(short, long, value_name = "EXTENSION")]
    pub extension: Option<String>,

    /// Only list items whose name matches a glob pattern (e.g. 'views.view.*')
    #[arg(long, value_name = "PATTERN")]
    pub only: Option<String>,
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs, context: &Context) -> Result<()> {
    let site = open_site(&context.config_path)?;
    let changes = pending_changes(
        &site,
        args.extension.as_deref(),
        !args.all,
        args.only.as_deref(),
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
        return Ok(());
    }

    let out = &context.out;
    if changes.is_empty() {
        println!(
            "{} No pending configuration changes",
            emoji(out, "✅", "[OK]")
        );
        return Ok(());
    }

    print_tree(&build_tree(&changes, out))?;
    println!(
        "\n{} configuration item(s) can be updated. Run 'config-sync update{}' to apply.",
        changes.count(),
        if args.all { " --all" } else { "" }
    );
    Ok(())
}

fn build_tree(changes: &FullChangelist, out: &OutputConfig) -> ptree::item::StringItem {
    let mut tree = TreeBuilder::new(format!(
        "{} Pending changes ({})",
        emoji(out, "📦", "[CHANGES]"),
        changes.count()
    ));
    for (extension_type, name, changelist) in changes.iter() {
        tree.begin_child(format!("{} {}", extension_type, name));
        for (kind, items) in changelist.kinds() {
            tree.begin_child(change_label(out, kind));
            for item in items {
                tree.add_empty_child(item.clone());
            }
            tree.end_child();
        }
        tree.end_child();
    }
    tree.build()
}
