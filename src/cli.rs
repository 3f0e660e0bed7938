//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, Context};
use resource_overlay::defaults::ROOT_DIR_ENV;
use resource_overlay::output::OutputConfig;

/// Resource Overlay - Build a virtual resource repository from package mappings
#[derive(Parser, Debug)]
#[command(name = "resource-overlay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Directory of the root package
    #[arg(long, global = true, value_name = "DIR", env = ROOT_DIR_ENV, default_value = ".")]
    root_dir: PathBuf,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the repository and report what was added
    Build(commands::build::BuildArgs),

    /// List the contents of a repository path
    Ls(commands::ls::LsArgs),

    /// Display the repository as a tree
    Tree(commands::tree::TreeArgs),

    /// Map a repository path in the root package
    Map(commands::map::MapArgs),

    /// Remove a mapping from the root package
    Unmap(commands::unmap::UnmapArgs),

    /// List path conflicts and optionally resolve them
    Conflicts(commands::conflicts::ConflictsArgs),

    /// List installed packages and their mappings
    Packages(commands::packages::PackagesArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let mut logger = env_logger::Builder::new();
        logger.parse_filters(&self.log_level);
        if let Ok(filters) = std::env::var("RUST_LOG") {
            logger.parse_filters(&filters);
        }
        logger.format_timestamp(None).format_target(false).init();

        let context = Context {
            root_dir: self.root_dir,
            output: OutputConfig::from_env_and_flag(&self.color),
        };

        match self.command {
            Commands::Build(args) => commands::build::execute(args, &context),
            Commands::Ls(args) => commands::ls::execute(args, &context),
            Commands::Tree(args) => commands::tree::execute(args, &context),
            Commands::Map(args) => commands::map::execute(args, &context),
            Commands::Unmap(args) => commands::unmap::execute(args, &context),
            Commands::Conflicts(args) => commands::conflicts::execute(args, &context),
            Commands::Packages(args) => commands::packages::execute(args, &context),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
