//! # Repository Builder
//!
//! The [`RepositoryBuilder`] turns the mappings of a [`PackageSet`] into a
//! virtual resource tree. It owns the package set, the destination
//! [`ResourceRepository`], the [`PackageMetadataStore`] and every
//! [`PathConflict`] it has detected.
//!
//! ## Full builds
//!
//! [`RepositoryBuilder::build_repository`] loads every mapping of every
//! package, classifies the loaded mappings against the override graph and
//! adds the enabled ones to an empty repository, overridden content first.
//! Mappings from packages with no override relation that contend for a path
//! are grouped into conflicts and kept out of the tree. In
//! [`BuildMode::Strict`] the first such group fails the build instead.
//!
//! ## Incremental changes
//!
//! The other mutating operations change the package set and then replan only
//! the *region* touched by the change: the mappings whose paths overlap the
//! changed paths, closed under overlap. Each change is applied as a
//! transaction. The builder snapshots its state, mutates it, updates
//! conflicts, writes the tree delta and persists the root package. If any
//! step fails, the tree and the in-memory state are restored and the error
//! is returned unchanged. Incremental changes never fail on conflicts; they
//! record them whatever the build mode.
//!
//! Every mutating operation returns the [`TreeOp`]s it applied, in order.

mod plan;
mod transaction;

use log::{debug, info, warn};

use crate::config::BuildMode;
use crate::conflict::{ConflictIndex, PathConflict};
use crate::error::{Error, Result};
use crate::mapping::{MappingKey, MappingState, PathMapping};
use crate::metadata::PackageMetadataStore;
use crate::override_graph::OverrideGraph;
use crate::package::{Package, PackageSet};
use crate::path;
use crate::reference::{ReferenceResolver, Resolution};
use crate::repository::{Resource, ResourceRepository};

use plan::Cluster;
use transaction::Region;

/// One change applied to the resource repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOp {
    Add { path: String, resource: Resource },
    Remove { path: String },
}

impl TreeOp {
    pub fn path(&self) -> &str {
        match self {
            TreeOp::Add { path, .. } | TreeOp::Remove { path } => path,
        }
    }
}

/// A mapping's content as currently added to the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TreeEntry {
    pub key: MappingKey,
    pub resource: Resource,
}

/// Builds and maintains a resource repository from a package set
pub struct RepositoryBuilder<R, S> {
    packages: PackageSet,
    repo: R,
    store: S,
    mode: BuildMode,
    conflicts: ConflictIndex,
    /// Adds currently in effect, in the order they were made
    entries: Vec<TreeEntry>,
}

impl<R: ResourceRepository, S: PackageMetadataStore> RepositoryBuilder<R, S> {
    /// Create a tolerant builder
    pub fn new(packages: PackageSet, repo: R, store: S) -> Self {
        Self {
            packages,
            repo,
            store,
            mode: BuildMode::Tolerant,
            conflicts: ConflictIndex::new(),
            entries: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn packages(&self) -> &PackageSet {
        &self.packages
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Direct access to the tree, bypassing the builder's bookkeeping
    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Give up the builder, keeping the repository it wrote
    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Load every mapping and fill the empty repository
    ///
    /// Fails with [`Error::RepositoryNotEmpty`] if the repository has
    /// content. In strict mode, unresolvable references and contending
    /// mappings fail the build.
    pub fn build_repository(&mut self) -> Result<Vec<TreeOp>> {
        if self.repo.has_children(path::ROOT) {
            return Err(Error::RepositoryNotEmpty);
        }

        self.conflicts.clear(&mut self.packages);
        self.entries.clear();
        self.load_all(self.mode == BuildMode::Strict)?;

        let candidates = self.candidates();
        let graph = OverrideGraph::new(&self.packages);
        let plan = plan::plan(&candidates, &graph);

        self.sync_conflicts(&[], &plan.clusters)?;

        // Conflicts stay recorded so callers can inspect them after the error
        if self.mode == BuildMode::Strict {
            if let Some(cluster) = plan.clusters.first() {
                return Err(conflict_error(cluster));
            }
        }

        let mut journal = Vec::new();
        for key in plan.enabled {
            let entry = self.entry_for(key)?;
            self.add_entry(entry, &mut journal)?;
        }

        info!(
            "Built repository: {} mappings added, {} conflicts",
            journal.len(),
            self.conflicts.len()
        );
        Ok(journal)
    }

    /// Remove everything from the repository
    ///
    /// Mappings and conflicts are left as they are; the next
    /// [`build_repository`](Self::build_repository) starts over.
    pub fn clear_repository(&mut self) -> Result<()> {
        self.repo.clear()?;
        self.entries.clear();
        debug!("Cleared repository");
        Ok(())
    }

    /// Add a mapping to the root package
    ///
    /// A root mapping already present at the same path is replaced. With
    /// `fail_on_unresolved`, a reference to an unknown package fails the
    /// call before anything changes; otherwise the mapping may load in the
    /// not-found state and contribute nothing.
    pub fn add_mapping(
        &mut self,
        mapping: PathMapping,
        fail_on_unresolved: bool,
    ) -> Result<Vec<TreeOp>> {
        if mapping.is_loaded() {
            return Err(Error::InvalidOperation {
                message: format!(
                    "the mapping for \"{}\" is already loaded",
                    mapping.repository_path()
                ),
            });
        }

        let root = self.packages.root_name().to_string();
        let resolution = ReferenceResolver::new(&self.packages, self.mode).resolve_all(
            mapping.path_references(),
            &root,
            fail_on_unresolved,
        )?;

        let repository_path = mapping.repository_path().to_string();
        let key = MappingKey::new(&root, &repository_path);
        let snapshot = self.snapshot();

        if let Err(e) = self.detach(&key) {
            self.restore(snapshot);
            return Err(e);
        }
        self.packages.root_mut().add_mapping(mapping);
        self.load_with(&key, resolution);

        info!("Mapped {} to {}", repository_path, self.reference_list(&key));
        self.commit(snapshot, Region::Paths(vec![repository_path]))
    }

    /// Remove the root package's mapping at a path
    ///
    /// Removing a path the root does not map changes nothing. Conflicts the
    /// mapping took part in lose it, and any that drop below two members
    /// resolve, which lets the remaining mapping back into the tree.
    pub fn remove_mapping(&mut self, repository_path: &str) -> Result<Vec<TreeOp>> {
        let Ok(repository_path) = path::normalize(repository_path) else {
            debug!("{} is not a repository path, nothing to remove", repository_path);
            return Ok(Vec::new());
        };
        if !self.packages.root().has_mapping(&repository_path) {
            debug!("No root mapping at {}, nothing to remove", repository_path);
            return Ok(Vec::new());
        }

        let key = MappingKey::new(self.packages.root_name(), &repository_path);
        let snapshot = self.snapshot();

        if let Err(e) = self.detach(&key) {
            self.restore(snapshot);
            return Err(e);
        }
        if let Some(mut removed) = self.packages.root_mut().remove_mapping(&repository_path) {
            removed.unload();
        }

        info!("Unmapped {}", repository_path);
        self.commit(snapshot, Region::Paths(vec![repository_path]))
    }

    /// Replace the root package's override order
    pub fn set_override_order(&mut self, order: Vec<String>) -> Result<Vec<TreeOp>> {
        let snapshot = self.snapshot();
        info!("Override order: {}", order.join(", "));
        self.packages.root_mut().set_override_order(order);
        self.commit(snapshot, Region::All)
    }

    /// Declare that the root package overrides another package
    pub fn add_overridden_package(&mut self, name: &str) -> Result<Vec<TreeOp>> {
        let snapshot = self.snapshot();
        if !self.packages.root_mut().add_overridden_package(name) {
            return Ok(Vec::new());
        }
        info!("Root package now overrides {}", name);
        self.commit(snapshot, Region::All)
    }

    /// Install a package and add its mappings
    ///
    /// Other packages' references to the new package may start resolving,
    /// so every mapping is reloaded.
    pub fn load_package(&mut self, package: Package) -> Result<Vec<TreeOp>> {
        let name = package.name().to_string();
        let snapshot = self.snapshot();

        let changed = self
            .packages
            .add(package)
            .and_then(|()| self.reload_all());
        if let Err(e) = changed {
            self.restore(snapshot);
            return Err(e);
        }

        info!("Loaded package {}", name);
        self.commit(snapshot, Region::All)
    }

    /// Uninstall a package and remove its mappings
    pub fn unload_package(&mut self, name: &str) -> Result<Vec<TreeOp>> {
        let snapshot = self.snapshot();

        self.conflicts.clear(&mut self.packages);
        let changed = self
            .packages
            .remove(name)
            .and_then(|_| self.reload_all());
        if let Err(e) = changed {
            self.restore(snapshot);
            return Err(e);
        }

        info!("Unloaded package {}", name);
        self.commit(snapshot, Region::All)
    }

    /// Unresolved conflicts, oldest first
    pub fn get_path_conflicts(&self) -> Vec<&PathConflict> {
        self.conflicts.unresolved().collect()
    }

    /// The root package's mapping at a path
    pub fn get_mapping(&self, repository_path: &str) -> Option<&PathMapping> {
        let repository_path = path::normalize(repository_path).ok()?;
        self.packages.root().mapping(&repository_path)
    }

    pub fn has_mapping(&self, repository_path: &str) -> bool {
        self.get_mapping(repository_path).is_some()
    }

    /// Every package's mapping at a path
    pub fn find_mappings(&self, repository_path: &str) -> Vec<&PathMapping> {
        let Ok(repository_path) = path::normalize(repository_path) else {
            return Vec::new();
        };
        self.packages
            .iter()
            .filter_map(|package| package.mapping(&repository_path))
            .collect()
    }

    /// Every mapping in a state, in load order
    pub fn get_mappings(&self, state: MappingState) -> Vec<&PathMapping> {
        self.packages
            .mappings()
            .map(|(_, mapping)| mapping)
            .filter(|mapping| mapping.state() == state)
            .collect()
    }

    /// Load every mapping of every package
    fn load_all(&mut self, fail_on_error: bool) -> Result<()> {
        let keys: Vec<MappingKey> = self
            .packages
            .mappings()
            .map(|(package, mapping)| MappingKey::new(package.name(), mapping.repository_path()))
            .collect();

        for key in keys {
            let references = match self.packages.mapping(&key) {
                Some(mapping) => mapping.path_references().to_vec(),
                None => continue,
            };
            let resolution = ReferenceResolver::new(&self.packages, self.mode).resolve_all(
                &references,
                &key.package,
                fail_on_error,
            )?;
            self.load_with(&key, resolution);
        }

        Ok(())
    }

    /// Drop every conflict and reload every mapping tolerantly
    fn reload_all(&mut self) -> Result<()> {
        self.conflicts.clear(&mut self.packages);
        self.load_all(false)
    }

    fn load_with(&mut self, key: &MappingKey, resolution: Resolution) {
        for error in &resolution.errors {
            warn!("{}: {}", key, error);
        }
        if let Some(mapping) = self.packages.mapping_mut(key) {
            mapping.load(&key.package, resolution);
            debug!("Loaded {} as {}", key, mapping.state());
        }
    }

    /// Take a mapping out of every conflict it is part of
    fn detach(&mut self, key: &MappingKey) -> Result<()> {
        let ids: Vec<_> = match self.packages.mapping(key) {
            Some(mapping) if mapping.is_loaded() => mapping.conflict_ids().collect(),
            _ => return Ok(()),
        };

        for id in ids {
            if let Some(conflict) = self.conflicts.get_mut(id) {
                conflict.remove_mapping(key, &mut self.packages)?;
            }
        }
        self.conflicts.prune();
        Ok(())
    }

    /// Loaded mappings with content, in declaration order
    fn candidates(&self) -> Vec<MappingKey> {
        candidates_of(&self.packages)
    }

    fn entry_for(&self, key: MappingKey) -> Result<TreeEntry> {
        let mapping = self.packages.mapping(&key).ok_or_else(|| Error::NotLoaded {
            path: key.repository_path.clone(),
        })?;
        let resource = Resource::new(&key.package, mapping.sources().to_vec());
        Ok(TreeEntry { key, resource })
    }

    fn reference_list(&self, key: &MappingKey) -> String {
        self.packages
            .mapping(key)
            .map(|mapping| mapping.reference_strings().join(", "))
            .unwrap_or_default()
    }

    /// Make the conflict index match the planned clusters
    ///
    /// Conflicts touching `previous` (or any of the clusters' members) are
    /// reused when a cluster keeps their path, and resolved otherwise.
    /// Conflicts outside the planned region stay untouched.
    fn sync_conflicts(&mut self, previous: &[MappingKey], clusters: &[Cluster]) -> Result<()> {
        let mut unclaimed = self.conflicts.ids_touching(
            previous
                .iter()
                .chain(clusters.iter().flat_map(|cluster| cluster.members.iter())),
        );

        for cluster in clusters {
            let reused = unclaimed.iter().position(|&id| {
                self.conflicts
                    .get(id)
                    .is_some_and(|conflict| conflict.repository_path() == cluster.path)
            });
            let id = match reused {
                Some(position) => unclaimed.remove(position),
                None => self.conflicts.create(&cluster.path).id(),
            };

            let Some(conflict) = self.conflicts.get_mut(id) else {
                continue;
            };
            for key in &cluster.members {
                conflict.add_mapping(key, &mut self.packages)?;
            }
            let stale: Vec<MappingKey> = conflict
                .mappings()
                .filter(|key| !cluster.members.contains(key))
                .cloned()
                .collect();
            for key in &stale {
                conflict.remove_mapping(key, &mut self.packages)?;
            }

            if reused.is_none() {
                let packages: Vec<&str> = conflict.package_names().collect();
                warn!(
                    "Conflict {} at {}: packages {} have no override relation",
                    id,
                    cluster.path,
                    packages.join(", ")
                );
            }
        }

        for id in unclaimed {
            if let Some(mut conflict) = self.conflicts.remove(id) {
                debug!("Conflict {} at {} resolved", id, conflict.repository_path());
                conflict.resolve(&mut self.packages);
            }
        }
        self.conflicts.prune();
        Ok(())
    }
}

fn candidates_of(packages: &PackageSet) -> Vec<MappingKey> {
    packages
        .mappings()
        .filter(|(_, mapping)| mapping.has_sources())
        .filter_map(|(_, mapping)| mapping.key())
        .collect()
}

fn conflict_error(cluster: &Cluster) -> Error {
    Error::ResourceConflict {
        path: cluster.path.clone(),
        packages: cluster
            .members
            .iter()
            .map(|key| key.package.clone())
            .collect(),
    }
}
