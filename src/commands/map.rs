//! # Map Command Implementation
//!
//! Adds a mapping to the root package and saves the root package file.
//!
//! ```bash
//! resource-overlay map /app/css res/css
//! resource-overlay map /app/theme @acme/theme:css @?acme/extras:css
//! ```
//!
//! A mapping the root package already has at the same path is replaced. By
//! default every referenced package must be installed; `--force` records the
//! mapping anyway, and it contributes nothing until the package appears.

use anyhow::Result;
use clap::Args;

use resource_overlay::config::BuildMode;
use resource_overlay::error::Error;
use resource_overlay::mapping::{MappingState, PathMapping};
use resource_overlay::output::{emoji, state_label};
use resource_overlay::suggestions;

use super::Context;

/// Map a repository path in the root package
#[derive(Args, Debug)]
pub struct MapArgs {
    /// Repository path to map (e.g., /app/css)
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Path references: local paths, @package:path or @?package:path
    #[arg(value_name = "REFERENCE", required = true, num_args = 1..)]
    pub references: Vec<String>,

    /// Record the mapping even if a referenced package is not installed
    #[arg(short, long)]
    pub force: bool,
}

/// Execute the `map` command.
pub fn execute(args: MapArgs, context: &Context) -> Result<()> {
    let mapping = match PathMapping::new(&args.path, &args.references) {
        Ok(mapping) => mapping,
        Err(Error::ResourceDefinition { reference, message }) if !reference.is_empty() => {
            return Err(suggestions::invalid_reference(&reference, &message));
        }
        Err(e) => return Err(e.into()),
    };
    let repository_path = mapping.repository_path().to_string();

    let mut builder = super::build_repository(context, BuildMode::Tolerant)?;
    let installed: Vec<String> = builder.packages().names().map(str::to_string).collect();

    let ops = builder
        .add_mapping(mapping, !args.force)
        .map_err(|e| match e {
            Error::NoSuchPackage { name } => {
                let installed: Vec<&str> = installed.iter().map(String::as_str).collect();
                suggestions::unknown_package(&name, &installed)
            }
            e => anyhow::Error::new(e).context("Failed to add mapping"),
        })?;

    let state = builder
        .get_mapping(&repository_path)
        .map(|mapping| mapping.state())
        .unwrap_or(MappingState::Unloaded);

    println!(
        "{} Mapped {} to {} ({})",
        emoji(&context.output, "✅", "[OK]"),
        repository_path,
        args.references.join(", "),
        state_label(&context.output, state)
    );
    println!("{} repository change(s)", ops.len());

    let root = builder.packages().root_name();
    for conflict in builder.get_path_conflicts() {
        let involves_mapping = conflict
            .mappings()
            .any(|key| key.repository_path == repository_path && key.package == root);
        if involves_mapping {
            let packages: Vec<&str> = conflict.package_names().collect();
            println!(
                "{} Conflicts with {} at {}",
                emoji(&context.output, "⚠️ ", "[WARN]"),
                packages.join(", "),
                conflict.repository_path()
            );
        }
    }

    Ok(())
}
