use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Create target folders row by row and report the outcome of each.
#[derive(Parser, Debug)]
#[command(name = "dircreate", version, about = "Provision folders from a row stream")]
pub struct Cli {
    /// Change to this directory before resolving relative paths.
    #[arg(short = 'C', long = "chdir", global = true)]
    pub chdir: Option<PathBuf>,
    /// Explicit configuration file.
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<PathBuf>,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process a JSON Lines row stream, appending the creation result columns.
    Run(RunArgs),
    /// Provision a single root/target pair and print the outcome.
    Check {
        root: String,
        target: String,
    },
    /// Show metadata of the columns appended to every row.
    Fields,
    /// Configuration display, validation, and template generation.
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
}

#[derive(Args, Debug, Default)]
pub struct FieldArgs {
    /// Input column holding the root folder path.
    #[arg(long = "root-field")]
    pub root_field: Option<String>,
    /// Input column holding the folder to create.
    #[arg(long = "target-field")]
    pub target_field: Option<String>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Read rows from this file instead of stdin.
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Write rows to this file instead of stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub fields: FieldArgs,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    Path,
    Check,
    Generate {
        #[arg()]
        path: Option<PathBuf>,
        #[arg(long = "force", default_value_t = false)]
        force: bool,
    },
    /// Store field selections in the configuration file.
    SetFields(FieldArgs),
}

/// Helper entry point so `main` can stay minimal.
pub fn parse() -> Cli {
    Cli::parse()
}
