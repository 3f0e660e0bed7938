//! # Ls Command Implementation
//!
//! Lists the contents of a repository path after building the repository.
//!
//! ## Functionality
//!
//! - **Directory Listing**: Shows the direct children of a path, merged across
//!   every mapping that contributes to it
//! - **Recursive Listing**: `--recursive` lists every file below the path
//! - **Pattern Filtering**: `--pattern` filters paths with a glob
//! - **Local Paths**: `--long` shows the local file backing each path
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;

use resource_overlay::config::BuildMode;
use resource_overlay::path;
use resource_overlay::suggestions;

use super::Context;

/// List the contents of a repository path
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Repository path to list
    #[arg(value_name = "PATH", default_value = "/")]
    pub path: String,

    /// List every file below the path
    #[arg(short, long)]
    pub recursive: bool,

    /// Filter paths by glob pattern (e.g., "/app/**/*.css")
    #[arg(short, long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Show the local path backing each entry
    #[arg(short, long)]
    pub long: bool,

    /// Show only the number of entries
    #[arg(long)]
    pub count: bool,
}

/// Execute the `ls` command.
pub fn execute(args: LsArgs, context: &Context) -> Result<()> {
    let repository_path = path::normalize(&args.path)?;
    let pattern = args
        .pattern
        .as_deref()
        .map(|pattern| glob::Pattern::new(pattern).map_err(|e| suggestions::invalid_glob(pattern, &e)))
        .transpose()?;

    let builder = super::build_repository(context, BuildMode::Tolerant)?;
    let repository = builder.repository();

    if repository_path != path::ROOT && !repository.contains(&repository_path) {
        anyhow::bail!("No such repository path: {}", repository_path);
    }

    let mut paths = if args.recursive {
        repository.walk(&repository_path)
    } else {
        repository.list(&repository_path)
    };
    if let Some(pattern) = &pattern {
        paths.retain(|candidate| pattern.matches(candidate));
    }

    if args.count {
        println!("{}", paths.len());
        return Ok(());
    }

    if paths.is_empty() {
        println!("No entries.");
        return Ok(());
    }

    for entry in &paths {
        match repository.get(entry).filter(|_| args.long) {
            Some(local) => println!("{} -> {}", entry, local.display()),
            None => println!("{}", entry),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_overlay::output::OutputConfig;
    use std::path::PathBuf;

    fn args(pattern: Option<&str>) -> LsArgs {
        LsArgs {
            path: "/".to_string(),
            recursive: false,
            pattern: pattern.map(str::to_string),
            long: false,
            count: false,
        }
    }

    #[test]
    fn test_invalid_pattern_is_reported_before_loading() {
        let context = Context {
            root_dir: PathBuf::from("/nonexistent/root"),
            output: OutputConfig::from_env_and_flag("never"),
        };

        let message = execute(args(Some("[")), &context).unwrap_err().to_string();
        assert!(message.contains("Invalid glob pattern"));
    }

    #[test]
    fn test_invalid_path_is_rejected() {
        let context = Context {
            root_dir: PathBuf::from("/nonexistent/root"),
            output: OutputConfig::from_env_and_flag("never"),
        };
        let mut args = args(None);
        args.path = "/a/../..".to_string();

        assert!(execute(args, &context).is_err());
    }
}
