//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, Context};
use config_sync::defaults;
use config_sync::output::OutputConfig;

/// Config Sync - Bring extension-provided configuration into a live site
#[derive(Parser, Debug)]
#[command(name = "config-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Path to the site manifest (defaults to config-sync.yaml, or the
    /// CONFIG_SYNC_CONFIG environment variable)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "warn",
        value_parser = ["off", "error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List pending configuration changes
    Status(commands::status::StatusArgs),

    /// Apply pending configuration changes to the active configuration
    Update(commands::update::UpdateArgs),

    /// Record the current state as the synchronization baseline
    Snapshot(commands::snapshot::SnapshotArgs),

    /// Show one configuration item as shipped, snapshotted and active
    Diff(commands::diff::DiffArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let context = Context {
            config_path: self.config.unwrap_or_else(defaults::default_config_path),
            out: OutputConfig::from_env_and_flag(&self.color),
        };

        match self.command {
            Commands::Status(args) => commands::status::execute(args, &context),
            Commands::Update(args) => commands::update::execute(args, &context),
            Commands::Snapshot(args) => commands::snapshot::execute(args, &context),
            Commands::Diff(args) => commands::diff::execute(args, &context),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Initialize `env_logger`; `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
