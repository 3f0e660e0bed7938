//! # Resource Overlay Library
//!
//! This library assembles a virtual resource repository from the resources
//! that a root package and its installed packages declare. Each package maps
//! repository paths (such as `/acme/blog/css`) to directories or files inside
//! itself or inside other packages. Packages can override each other, and
//! the library decides, for every repository path, whose content wins. It is
//! used by the `resource-overlay` command-line tool but can be embedded in
//! any application that needs the same overlay semantics.
//!
//! ## Quick Example
//!
//! ```
//! use resource_overlay::builder::RepositoryBuilder;
//! use resource_overlay::metadata::NullMetadataStore;
//! use resource_overlay::package::{Package, PackageSet};
//! use resource_overlay::repository::InMemoryRepository;
//!
//! let root = Package::root("acme/app", std::path::Path::new("/srv/app"));
//! let packages = PackageSet::new(root);
//!
//! let mut builder = RepositoryBuilder::new(packages, InMemoryRepository::new(), NullMetadataStore);
//! let ops = builder.build_repository().unwrap();
//! assert!(ops.is_empty());
//! assert!(builder.get_path_conflicts().is_empty());
//! ```
//!
//! ## Core Concepts
//!
//! - **Packages (`package`, `config`)**: A package has a name, an install
//!   directory, a list of packages it overrides and a set of path mappings.
//!   Packages are described by `resources.json` (or `.yaml`) package files.
//! - **Mappings and references (`mapping`, `reference`)**: A mapping ties a
//!   repository path to one or more path references such as `res/css` or
//!   `@acme/theme:css`. References resolve to local filesystem paths.
//! - **Overrides (`override_graph`)**: Declared overrides, closed
//!   transitively, plus the root package's `override-order`, decide which
//!   of two packages wins.
//! - **Conflicts (`conflict`)**: Mappings of packages with no override
//!   relation that contend for a path are recorded as path conflicts and
//!   kept out of the repository until the conflict resolves.
//! - **Repository (`repository`, `builder`)**: The builder writes the
//!   enabled mappings into a [`ResourceRepository`](repository::ResourceRepository)
//!   with "last add wins" semantics, and keeps it up to date as mappings,
//!   packages and overrides change.
//! - **Persistence (`metadata`)**: After every change the root package's
//!   metadata is handed to a [`PackageMetadataStore`](metadata::PackageMetadataStore).
//!
//! ## Build Flow
//!
//! 1.  **Loading**: Every mapping resolves its references. Mappings whose
//!     references all point nowhere are marked not-found.
//! 2.  **Classification**: Overlapping mappings of different packages are
//!     compared through the override graph. Unordered pairs are conflicts.
//! 3.  **Writing**: Enabled mappings are added to the repository, overridden
//!     content first, so that overriding content shadows it.
//!
//! Incremental operations replan only the part of the repository that a
//! change can affect, and roll back completely when a step fails.

pub mod builder;
pub mod config;
pub mod conflict;
pub mod defaults;
pub mod error;
pub mod mapping;
pub mod metadata;
pub mod output;
pub mod override_graph;
pub mod package;
pub mod path;
pub mod reference;
pub mod repository;
pub mod suggestions;

#[cfg(test)]
mod path_proptest;
