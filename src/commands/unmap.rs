//! # Unmap Command Implementation
//!
//! Removes the root package's mapping at a repository path and saves the
//! root package file. Conflicts the mapping took part in lose it; a conflict
//! left with a single mapping resolves and that mapping returns to the
//! repository.

use anyhow::Result;
use clap::Args;

use resource_overlay::config::BuildMode;
use resource_overlay::output::emoji;
use resource_overlay::path;

use super::Context;

/// Remove a mapping from the root package
#[derive(Args, Debug)]
pub struct UnmapArgs {
    /// Repository path to unmap
    #[arg(value_name = "PATH")]
    pub path: String,
}

/// Execute the `unmap` command.
pub fn execute(args: UnmapArgs, context: &Context) -> Result<()> {
    let repository_path = path::normalize(&args.path)?;
    let mut builder = super::build_repository(context, BuildMode::Tolerant)?;

    if !builder.has_mapping(&repository_path) {
        anyhow::bail!(
            "The root package does not map {}\n\n\
             hint: Run 'resource-overlay packages --mappings' to list mappings",
            repository_path
        );
    }

    let conflicts_before = builder.get_path_conflicts().len();
    let ops = builder.remove_mapping(&repository_path)?;
    let resolved = conflicts_before.saturating_sub(builder.get_path_conflicts().len());

    println!(
        "{} Unmapped {} ({} repository change(s))",
        emoji(&context.output, "🗑️ ", "[OK]"),
        repository_path,
        ops.len()
    );
    if resolved > 0 {
        println!("{} conflict(s) resolved", resolved);
    }

    Ok(())
}
