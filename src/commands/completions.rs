//! Shell completions for `config-sync`.
//!
//! The script for the chosen shell is printed on stdout; redirect it to
//! wherever that shell loads completions from:
//!
//! ```bash
//! config-sync completions zsh > ~/.zfunc/_config-sync
//! config-sync completions fish > ~/.config/fish/completions/config-sync.fish
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io;

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, bin_name, &mut io::stdout());
    Ok(())
}
