//! CLI command definitions and execution
//!
//! Every command reads and writes through resource descriptors:
//! `-`, `text:<literal>`, `pipe:<shell command>`, `file:<path>` or a plain path.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tarp_core::{Config, ConfigManager, Opener, TracingSink};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod cat;
mod completions;
mod split;

/// tarp - split record streams into shards
///
/// Inputs and outputs are descriptors: `-` for stdin/stdout, `text:...` for
/// literal input, `pipe:...` for a shell command, otherwise a file path.
#[derive(Parser, Debug)]
#[command(name = "tarp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinner
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Help footer for commands that accept `pipe:` descriptors
const SHELL_NOTE: &str = "\
`pipe:` commands and --post hooks run under `/bin/sh -c`, not bash.
Set [shell] program = \"/bin/bash\" in config.toml to use bash syntax.";

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Concatenate inputs into one output
    #[command(after_help = SHELL_NOTE)]
    Cat(cat::CatArgs),

    /// Split newline-delimited records into shards
    #[command(after_help = SHELL_NOTE)]
    Split(split::SplitArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    if let Commands::Completions(args) = cli.command {
        return completions::execute(args);
    }

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            Formatter::new(output_config).error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };
    let opener = Opener::new(Arc::new(TracingSink)).with_shell(config.shell.clone());

    match cli.command {
        Commands::Cat(args) => cat::execute(args, &opener, output_config).await,
        Commands::Split(args) => split::execute(args, &opener, &config, output_config).await,
        Commands::Completions(_) => ExitCode::Success,
    }
}

fn load_config() -> tarp_core::Result<Config> {
    let manager = ConfigManager::new()?;
    tracing::debug!(path = %manager.config_path().display(), "loading config");
    manager.load()
}
