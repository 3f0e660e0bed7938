//! # Build Command Implementation
//!
//! Loads the root package and every installed package, builds the resource
//! repository and reports what happened:
//!
//! - how many mappings were added to the repository,
//! - which mappings resolved to nothing,
//! - which path conflicts were detected.
//!
//! With `--strict`, unresolvable references and conflicts fail the command.
//! The command never writes to disk.

use anyhow::Result;
use clap::Args;

use resource_overlay::config::BuildMode;
use resource_overlay::mapping::MappingState;
use resource_overlay::output::emoji;

use super::Context;

/// Build the repository and report what was added
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Fail on unresolvable references and on conflicts
    #[arg(long)]
    pub strict: bool,

    /// Print every added path
    #[arg(short, long)]
    pub verbose: bool,
}

/// Execute the `build` command.
pub fn execute(args: BuildArgs, context: &Context) -> Result<()> {
    let mode = if args.strict {
        BuildMode::Strict
    } else {
        BuildMode::Tolerant
    };
    let output = &context.output;

    let builder = super::build_repository(context, mode)?;
    let repository = builder.repository();

    if args.verbose {
        for entry in repository.entries() {
            println!("  + {} ({})", entry.path, entry.resource.package);
        }
    }

    println!(
        "{} Built repository from {} package(s): {} mapping(s) added",
        emoji(output, "🔨", "[BUILD]"),
        builder.packages().len(),
        repository.len()
    );

    let not_found = builder.get_mappings(MappingState::NotFound);
    if !not_found.is_empty() {
        println!(
            "{} {} mapping(s) resolved to nothing:",
            emoji(output, "⚠️ ", "[WARN]"),
            not_found.len()
        );
        for mapping in not_found {
            println!(
                "  {} ({})",
                mapping.repository_path(),
                mapping.containing_package().unwrap_or_default()
            );
        }
    }

    let conflicts = builder.get_path_conflicts();
    if !conflicts.is_empty() {
        println!(
            "{} {} conflict(s) detected:",
            emoji(output, "❌", "[CONFLICT]"),
            conflicts.len()
        );
        for conflict in conflicts {
            let packages: Vec<&str> = conflict.package_names().collect();
            println!("  {}: {}", conflict.repository_path(), packages.join(", "));
        }
        println!("Run 'resource-overlay conflicts --resolve' to pick winners.");
    }

    Ok(())
}
