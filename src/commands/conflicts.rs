//! # Conflicts Command Implementation
//!
//! Lists the path conflicts of the built repository. Each conflict names the
//! contending packages and the paths they map.
//!
//! With `--resolve`, the user picks a winning package for every conflict
//! (interactively, or up front with `--prefer`). The choice is recorded in
//! the root package's `override-order`: the losing packages are listed
//! before the winner, which makes the winner override them.

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Select};

use resource_overlay::config::BuildMode;
use resource_overlay::conflict::PathConflict;
use resource_overlay::output::emoji;
use resource_overlay::suggestions;

use super::Context;

/// List path conflicts and optionally resolve them
#[derive(Args, Debug)]
pub struct ConflictsArgs {
    /// Pick a winner for each conflict and record it in the override order
    #[arg(long)]
    pub resolve: bool,

    /// Package that wins every conflict it takes part in (implies --resolve)
    #[arg(long, value_name = "PACKAGE")]
    pub prefer: Option<String>,
}

/// Execute the `conflicts` command.
pub fn execute(args: ConflictsArgs, context: &Context) -> Result<()> {
    let mut builder = super::build_repository(context, BuildMode::Tolerant)?;
    let output = &context.output;

    if let Some(preferred) = &args.prefer {
        if !builder.packages().contains(preferred) {
            let installed: Vec<&str> = builder.packages().names().collect();
            return Err(suggestions::unknown_package(preferred, &installed));
        }
    }

    let conflicts: Vec<PathConflict> = builder.get_path_conflicts().into_iter().cloned().collect();
    if conflicts.is_empty() {
        println!("{} No conflicts.", emoji(output, "✅", "[OK]"));
        return Ok(());
    }

    for conflict in &conflicts {
        print_conflict(conflict);
    }

    if !args.resolve && args.prefer.is_none() {
        println!();
        println!("Run 'resource-overlay conflicts --resolve' to pick winners.");
        return Ok(());
    }

    let mut winners = Vec::new();
    for conflict in &conflicts {
        let packages: Vec<String> = conflict.package_names().map(str::to_string).collect();
        let winner = match &args.prefer {
            Some(preferred) if packages.contains(preferred) => preferred.clone(),
            Some(_) => continue,
            None => {
                let selection = Select::with_theme(&ColorfulTheme::default())
                    .with_prompt(format!("Which package wins {}?", conflict.repository_path()))
                    .items(&packages)
                    .default(0)
                    .interact()?;
                packages[selection].clone()
            }
        };
        winners.push((winner, packages));
    }

    let order = override_order(builder.packages().root().override_order(), &winners);
    builder.set_override_order(order)?;

    let remaining = builder.get_path_conflicts().len();
    println!(
        "{} Resolved {} conflict(s), {} remaining",
        emoji(output, "✅", "[OK]"),
        conflicts.len().saturating_sub(remaining),
        remaining
    );

    Ok(())
}

fn print_conflict(conflict: &PathConflict) {
    println!("{} {}", conflict.id(), conflict.repository_path());
    for key in conflict.mappings() {
        println!("  {} maps {}", key.package, key.repository_path);
    }
}

/// Extend an override order so that each winner follows its losers
///
/// Packages that lose are moved to the end of the order, followed by the
/// winner, so later choices take precedence over earlier ones.
fn override_order(current: &[String], winners: &[(String, Vec<String>)]) -> Vec<String> {
    let mut order: Vec<String> = current.to_vec();

    for (winner, packages) in winners {
        order.retain(|name| name != winner && !packages.contains(name));
        order.extend(packages.iter().filter(|name| *name != winner).cloned());
        order.push(winner.clone());
    }

    order
}
