//! # Update Command Implementation
//!
//! Applies pending configuration changes to the active configuration and
//! re-snapshots every extension that was updated.
//!
//! ## Functionality
//!
//! - **Safe by default**: only changes that do not touch site customizations
//!   are applied. `--all` also applies the rest, after confirmation (skipped
//!   with `--yes`).
//! - **Scope**: `--extension` limits the update to one extension, `--only`
//!   to items whose names match a glob pattern. With `--only` just the
//!   applied items are re-snapshotted; the rest stay pending.
//! - **Dry Run**: `--dry-run` lists what would be applied without writing.
//! - **Exit status**: non-zero when any item failed to apply.

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};

use super::{open_site, pending_changes, Context};
use config_sync::manager::UpdateReport;
use config_sync::output::{change_label, emoji};

/// Apply pending configuration changes
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Also apply changes that overwrite site customizations
    #[arg(long)]
    pub all: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Only update one extension (type:name, e.g. module:node)
    #[arg(short, long, value_name = "EXTENSION")]
    pub extension: Option<String>,

    /// Only update items whose name matches a glob pattern
    #[arg(long, value_name = "PATTERN")]
    pub only: Option<String>,

    /// Show what would be updated without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `update` command.
pub fn execute(args: UpdateArgs, context: &Context) -> Result<()> {
    let out = &context.out;
    let site = open_site(&context.config_path)?;
    let safe_only = !args.all;
    let changes = pending_changes(
        &site,
        args.extension.as_deref(),
        safe_only,
        args.only.as_deref(),
    )?;

    if changes.is_empty() {
        println!(
            "{} Configuration is up to date",
            emoji(out, "✅", "[OK]")
        );
        return Ok(());
    }

    println!(
        "{} {} configuration item(s) to apply:",
        emoji(out, "📦", "[CHANGES]"),
        changes.count()
    );
    for (extension_type, name, changelist) in changes.iter() {
        for (kind, items) in changelist.kinds() {
            for item in items {
                println!(
                    "  {} {} ({} {})",
                    change_label(out, kind),
                    item,
                    extension_type,
                    name
                );
            }
        }
    }

    if args.dry_run {
        println!(
            "\n{} Dry run mode - no changes will be made.",
            emoji(out, "ℹ️ ", "[INFO]")
        );
        return Ok(());
    }

    if args.all && !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("This may overwrite customized configuration. Continue?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Update cancelled.");
            return Ok(());
        }
    }

    let progress = ProgressBar::new(changes.count() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut report = UpdateReport::default();
    for (extension_type, name, changelist) in changes.iter() {
        progress.set_message(format!("{} {}", extension_type, name));
        let extension_report = if args.only.is_some() {
            site.manager.update_items(extension_type, name, changelist)?
        } else {
            site.manager.update_extension(
                extension_type,
                name,
                Some(changelist.clone()),
                safe_only,
            )?
        };
        report.absorb(extension_report);
        progress.inc(changelist.len() as u64);
    }
    progress.finish_and_clear();

    println!(
        "{} Created {} and updated {} configuration item(s)",
        emoji(out, "✅", "[DONE]"),
        report.created.len(),
        report.updated.len()
    );
    for item in &report.skipped {
        println!(
            "{} {} already exists, kept the site's copy",
            emoji(out, "⏭️ ", "[SKIPPED]"),
            item
        );
    }

    if !report.is_success() {
        for failure in &report.failed {
            eprintln!("{} {}", emoji(out, "❌", "[FAILED]"), failure);
        }
        anyhow::bail!("{} configuration item(s) failed to apply", report.failed.len());
    }
    Ok(())
}
