//! # CLI Command Implementations
//!
//! Each subcommand of the `resource-overlay` tool lives in its own module,
//! with an `Args` struct derived using `clap` and an `execute` function that
//! performs the command.
//!
//! Every command starts from the root package directory given by
//! `--root-dir`: it loads the package set, builds the repository in memory
//! and then reads or changes it. Commands that change mappings or the
//! override order persist the root package file through the builder.

pub mod build;
pub mod completions;
pub mod conflicts;
pub mod ls;
pub mod map;
pub mod packages;
pub mod tree;
pub mod unmap;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use resource_overlay::builder::RepositoryBuilder;
use resource_overlay::config::BuildMode;
use resource_overlay::defaults;
use resource_overlay::error::Error;
use resource_overlay::metadata::FileMetadataStore;
use resource_overlay::output::OutputConfig;
use resource_overlay::package::PackageSet;
use resource_overlay::repository::InMemoryRepository;
use resource_overlay::suggestions;

/// Settings shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    pub root_dir: PathBuf,
    pub output: OutputConfig,
}

/// Builder used by the CLI: an in-memory tree persisted to the root package file
pub type Builder = RepositoryBuilder<InMemoryRepository, FileMetadataStore>;

/// Load the package set of the root directory
pub fn open_builder(context: &Context, mode: BuildMode) -> Result<Builder> {
    let root_dir = &context.root_dir;
    if defaults::find_package_file(root_dir).is_none() {
        return Err(suggestions::package_file_not_found(root_dir));
    }

    let packages = PackageSet::load(root_dir)
        .with_context(|| format!("Failed to load packages from {}", root_dir.display()))?;
    let store = FileMetadataStore::for_package_dir(root_dir);

    Ok(RepositoryBuilder::new(packages, InMemoryRepository::new(), store).with_mode(mode))
}

/// Load the package set and build the repository
pub fn build_repository(context: &Context, mode: BuildMode) -> Result<Builder> {
    let mut builder = open_builder(context, mode)?;
    match builder.build_repository() {
        Ok(_) => Ok(builder),
        Err(Error::ResourceConflict { path, packages }) => {
            Err(suggestions::unresolved_conflict(&path, &packages))
        }
        Err(e) => Err(anyhow::Error::new(e).context("Failed to build repository")),
    }
}
