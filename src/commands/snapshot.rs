//! # Snapshot Command Implementation
//!
//! Records the current extension-provided and active configuration as the
//! baseline later comparisons start from. Without arguments the whole
//! snapshot is rebuilt; `--extension` refreshes one extension only and
//! `--delete` removes the snapshot.

use anyhow::Result;
use clap::Args;

use super::{open_site, resolve_extension, Context};
use config_sync::output::emoji;
use config_sync::suggestions;

/// Record the current state as the synchronization baseline
#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Only snapshot one extension (type:name, e.g. module:node)
    #[arg(short, long, value_name = "EXTENSION", conflicts_with = "delete")]
    pub extension: Option<String>,

    /// Delete the snapshot instead of creating one
    #[arg(long)]
    pub delete: bool,
}

/// Execute the `snapshot` command.
pub fn execute(args: SnapshotArgs, context: &Context) -> Result<()> {
    let out = &context.out;
    let site = open_site(&context.config_path)?;

    if args.delete {
        if !site.has_snapshot()? {
            return Err(suggestions::no_snapshot());
        }
        site.snapshotter.delete_snapshot()?;
        println!("{} Snapshot deleted", emoji(out, "🗑️ ", "[DELETED]"));
        return Ok(());
    }

    match args.extension.as_deref() {
        Some(reference) => {
            let (extension_type, name) = resolve_extension(&site, reference)?;
            site.snapshotter
                .create_extension_snapshot(extension_type, &name)?;
            println!(
                "{} Snapshot of {} {} created",
                emoji(out, "📸", "[SNAPSHOT]"),
                extension_type,
                name
            );
        }
        None => {
            site.snapshotter.create_full_snapshot()?;
            let items = site.stores.snapshot_extension.list_all("")?.len();
            println!(
                "{} Snapshot created ({} item(s)) in {}",
                emoji(out, "📸", "[SNAPSHOT]"),
                items,
                site.config.snapshot_dir().display()
            );
        }
    }
    Ok(())
}
