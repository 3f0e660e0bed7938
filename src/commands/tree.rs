//! # Tree Command Implementation
//!
//! Displays the built repository below a path as a hierarchical tree.
//!
//! ## Functionality
//!
//! - **Repository Tree Visualization**: Directories and files of the merged
//!   repository, virtual directories included
//! - **Depth Control**: `--depth` limits how far the tree is expanded
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::borrow::Cow;
use std::io;

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, Style, TreeItem};

use resource_overlay::config::BuildMode;
use resource_overlay::path;
use resource_overlay::repository::InMemoryRepository;

use super::Context;

/// Display the repository as a tree
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Repository path to start from
    #[arg(value_name = "PATH", default_value = "/")]
    pub path: String,

    /// Maximum depth to display.
    ///
    /// Use 0 to show only the starting path, 1 for its direct children, etc.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs, context: &Context) -> Result<()> {
    let repository_path = path::normalize(&args.path)?;
    let builder = super::build_repository(context, BuildMode::Tolerant)?;

    let root = build_tree_node(
        builder.repository(),
        &repository_path,
        repository_path.clone(),
        args.depth.unwrap_or(usize::MAX),
        0,
    );
    print_tree(&root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;

    Ok(())
}

/// Build the tree node for a repository path
fn build_tree_node(
    repository: &InMemoryRepository,
    repository_path: &str,
    label: String,
    max_depth: usize,
    current_depth: usize,
) -> TreeNode {
    if current_depth >= max_depth {
        return TreeNode {
            label,
            children: vec![],
        };
    }

    let children = repository
        .list(repository_path)
        .into_iter()
        .map(|child| {
            let name = path::relative_to(repository_path, &child)
                .unwrap_or_default()
                .to_string();
            build_tree_node(repository, &child, name, max_depth, current_depth + 1)
        })
        .collect();

    TreeNode { label, children }
}

/// Tree node structure for ptree visualization
#[derive(Clone, Debug, PartialEq)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &Style) -> io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
