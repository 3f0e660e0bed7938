//! # Packages Command Implementation
//!
//! Lists the root package and every installed package with its install path
//! and the packages it overrides. With `--mappings`, each package's mappings
//! are listed too, with the state they ended up in after building.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;

use resource_overlay::config::BuildMode;
use resource_overlay::output::state_label;
use resource_overlay::package::Package;

use super::Context;

/// List installed packages and their mappings
#[derive(Args, Debug)]
pub struct PackagesArgs {
    /// List each package's mappings and their state
    #[arg(short, long)]
    pub mappings: bool,
}

/// Execute the `packages` command.
pub fn execute(args: PackagesArgs, context: &Context) -> Result<()> {
    let builder = super::build_repository(context, BuildMode::Tolerant)?;
    let packages = builder.packages();

    for package in packages.iter() {
        println!("{}", describe(package));

        if args.mappings {
            for mapping in package.mappings() {
                println!(
                    "  {} -> {} [{}]",
                    mapping.repository_path(),
                    mapping.reference_strings().join(", "),
                    state_label(&context.output, mapping.state())
                );
            }
        }
    }

    let override_order = packages.root().override_order();
    if !override_order.is_empty() {
        println!("override order: {}", override_order.join(" < "));
    }

    Ok(())
}

/// One-line summary of a package
fn describe(package: &Package) -> String {
    let mut line = format!("{} ({})", package.name(), package.install_path().display());
    if package.is_root() {
        line.push_str(" [root]");
    }

    let overridden: Vec<&str> = package
        .overridden_package_names()
        .iter()
        .map(String::as_str)
        .collect();
    if !overridden.is_empty() {
        line.push_str(&format!(" overrides {}", overridden.join(", ")));
    }
    line
}
