//! Path conflicts
//!
//! A [`PathConflict`] records that mappings from two or more packages
//! contend for a repository path (or for nested paths below it) with no
//! override relation between their packages. It holds at most one mapping
//! per package.
//!
//! The link between a conflict and its mappings is kept on both sides: the
//! conflict stores mapping keys by package name, and each mapping stores the
//! ids of the conflicts it belongs to. Only [`PathConflict::add_mapping`],
//! [`PathConflict::remove_mapping`] and [`PathConflict::resolve`] change that
//! link, so both sides always agree.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::mapping::MappingKey;
use crate::package::PackageSet;

/// Stable identifier of a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConflictId(u64);

impl ConflictId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Contention between mappings of different packages at a repository path
#[derive(Debug, Clone)]
pub struct PathConflict {
    id: ConflictId,
    repository_path: String,
    mappings: IndexMap<String, MappingKey>,
}

impl PathConflict {
    pub fn new(id: ConflictId, repository_path: &str) -> Self {
        Self {
            id,
            repository_path: repository_path.to_string(),
            mappings: IndexMap::new(),
        }
    }

    pub fn id(&self) -> ConflictId {
        self.id
    }

    /// The path at which the contention occurs
    pub fn repository_path(&self) -> &str {
        &self.repository_path
    }

    /// Contending mappings in the order they joined
    pub fn mappings(&self) -> impl Iterator<Item = &MappingKey> {
        self.mappings.values()
    }

    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }

    pub fn contains(&self, key: &MappingKey) -> bool {
        self.mappings.get(&key.package) == Some(key)
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.mappings.contains_key(package)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// A conflict with fewer than two mappings no longer contends
    pub fn is_resolved(&self) -> bool {
        self.mappings.len() < 2
    }

    /// Add a mapping to the conflict
    ///
    /// Adding a mapping twice has no effect. A mapping from a package that
    /// already has one in the conflict replaces it. Fails with
    /// [`Error::NotLoaded`] if the mapping is not loaded.
    pub fn add_mapping(&mut self, key: &MappingKey, packages: &mut PackageSet) -> Result<()> {
        ensure_loaded(key, packages)?;

        if self.contains(key) {
            return Ok(());
        }

        if let Some(previous) = self.mappings.shift_remove(&key.package) {
            if let Some(mapping) = packages.mapping_mut(&previous) {
                mapping.unlink_conflict(self.id);
            }
        }

        self.mappings.insert(key.package.clone(), key.clone());
        if let Some(mapping) = packages.mapping_mut(key) {
            mapping.link_conflict(self.id);
        }

        Ok(())
    }

    /// Remove a mapping from the conflict
    ///
    /// Removing a mapping that is not part of the conflict has no effect.
    /// When fewer than two mappings remain, the conflict resolves and lets
    /// go of the last one. Fails with [`Error::NotLoaded`] if the mapping is
    /// not loaded.
    pub fn remove_mapping(&mut self, key: &MappingKey, packages: &mut PackageSet) -> Result<()> {
        ensure_loaded(key, packages)?;

        if !self.contains(key) {
            return Ok(());
        }

        self.mappings.shift_remove(&key.package);
        if let Some(mapping) = packages.mapping_mut(key) {
            mapping.unlink_conflict(self.id);
        }

        if self.is_resolved() {
            self.resolve(packages);
        }

        Ok(())
    }

    /// Remove every mapping, leaving an empty, resolved conflict
    pub fn resolve(&mut self, packages: &mut PackageSet) {
        for (_, key) in self.mappings.drain(..) {
            if let Some(mapping) = packages.mapping_mut(&key) {
                mapping.unlink_conflict(self.id);
            }
        }
    }
}

fn ensure_loaded(key: &MappingKey, packages: &PackageSet) -> Result<()> {
    match packages.mapping(key) {
        Some(mapping)
            if mapping.is_loaded() && mapping.containing_package() == Some(key.package.as_str()) =>
        {
            Ok(())
        }
        _ => Err(Error::NotLoaded {
            path: key.repository_path.clone(),
        }),
    }
}

/// Every conflict known to a repository builder
#[derive(Debug, Clone, Default)]
pub struct ConflictIndex {
    conflicts: IndexMap<ConflictId, PathConflict>,
    next_id: u64,
}

impl ConflictIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty conflict at a path
    pub fn create(&mut self, repository_path: &str) -> &mut PathConflict {
        self.next_id += 1;
        let id = ConflictId(self.next_id);
        self.conflicts
            .entry(id)
            .or_insert_with(|| PathConflict::new(id, repository_path))
    }

    pub fn get(&self, id: ConflictId) -> Option<&PathConflict> {
        self.conflicts.get(&id)
    }

    pub fn get_mut(&mut self, id: ConflictId) -> Option<&mut PathConflict> {
        self.conflicts.get_mut(&id)
    }

    pub fn remove(&mut self, id: ConflictId) -> Option<PathConflict> {
        self.conflicts.shift_remove(&id)
    }

    /// Conflicts with at least one of the given mappings
    pub fn ids_touching<'a, I>(&self, keys: I) -> Vec<ConflictId>
    where
        I: IntoIterator<Item = &'a MappingKey>,
    {
        let keys: Vec<&MappingKey> = keys.into_iter().collect();
        self.conflicts
            .values()
            .filter(|conflict| keys.iter().any(|key| conflict.contains(key)))
            .map(PathConflict::id)
            .collect()
    }

    /// Drop conflicts that have resolved
    pub fn prune(&mut self) {
        self.conflicts.retain(|_, conflict| !conflict.is_resolved());
    }

    /// Resolve and drop every conflict
    pub fn clear(&mut self, packages: &mut PackageSet) {
        for (_, mut conflict) in self.conflicts.drain(..) {
            conflict.resolve(packages);
        }
    }

    /// Unresolved conflicts, oldest first
    pub fn unresolved(&self) -> impl Iterator<Item = &PathConflict> {
        self.conflicts.values().filter(|conflict| !conflict.is_resolved())
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{MappingState, PathMapping};
    use crate::package::Package;
    use crate::reference::Resolution;
    use std::path::{Path, PathBuf};

    /// Package set where every package maps `/app`, loaded with a fake source
    fn loaded_packages(names: &[&str]) -> PackageSet {
        let mut packages = PackageSet::new(Package::root("root", Path::new("/root")));
        for name in names {
            let mut package = Package::new(name, Path::new("/vendor"));
            package.add_mapping(PathMapping::new("/app", &["res"]).unwrap());
            package.add_mapping(PathMapping::new("/app/css", &["css"]).unwrap());
            packages.add(package).unwrap();
        }
        for name in names {
            for path in ["/app", "/app/css"] {
                packages
                    .mapping_mut(&MappingKey::new(name, path))
                    .unwrap()
                    .load(
                        name,
                        Resolution {
                            sources: vec![PathBuf::from("/vendor/res")],
                            errors: Vec::new(),
                        },
                    );
            }
        }
        packages
    }

    fn state(packages: &PackageSet, package: &str, path: &str) -> MappingState {
        packages.mapping(&MappingKey::new(package, path)).unwrap().state()
    }

    #[test]
    fn test_add_mapping_links_both_sides() {
        let mut packages = loaded_packages(&["p1", "p2"]);
        let mut index = ConflictIndex::new();
        let conflict = index.create("/app");
        let id = conflict.id();

        conflict.add_mapping(&MappingKey::new("p1", "/app"), &mut packages).unwrap();
        conflict.add_mapping(&MappingKey::new("p2", "/app"), &mut packages).unwrap();

        assert_eq!(conflict.len(), 2);
        assert!(!conflict.is_resolved());
        assert_eq!(state(&packages, "p1", "/app"), MappingState::Conflict);
        let p2 = packages.mapping(&MappingKey::new("p2", "/app")).unwrap();
        assert_eq!(p2.conflict_ids().collect::<Vec<_>>(), vec![id]);
    }

    #[test]
    fn test_add_mapping_is_idempotent() {
        let mut packages = loaded_packages(&["p1"]);
        let mut conflict = PathConflict::new(ConflictId::new(1), "/app");
        let key = MappingKey::new("p1", "/app");

        conflict.add_mapping(&key, &mut packages).unwrap();
        conflict.add_mapping(&key, &mut packages).unwrap();
        assert_eq!(conflict.len(), 1);
    }

    #[test]
    fn test_add_mapping_replaces_same_package() {
        let mut packages = loaded_packages(&["p1", "p2"]);
        let mut conflict = PathConflict::new(ConflictId::new(1), "/app");

        conflict.add_mapping(&MappingKey::new("p1", "/app"), &mut packages).unwrap();
        conflict.add_mapping(&MappingKey::new("p2", "/app"), &mut packages).unwrap();
        conflict
            .add_mapping(&MappingKey::new("p1", "/app/css"), &mut packages)
            .unwrap();

        assert_eq!(conflict.len(), 2);
        assert!(conflict.contains(&MappingKey::new("p1", "/app/css")));
        assert!(!conflict.contains(&MappingKey::new("p1", "/app")));
        assert_eq!(state(&packages, "p1", "/app"), MappingState::Enabled);
        assert_eq!(state(&packages, "p1", "/app/css"), MappingState::Conflict);
    }

    #[test]
    fn test_remove_mapping_below_two_resolves() {
        let mut packages = loaded_packages(&["p1", "p2", "p3"]);
        let mut conflict = PathConflict::new(ConflictId::new(1), "/app");
        for name in ["p1", "p2", "p3"] {
            conflict.add_mapping(&MappingKey::new(name, "/app"), &mut packages).unwrap();
        }

        conflict.remove_mapping(&MappingKey::new("p1", "/app"), &mut packages).unwrap();
        assert_eq!(conflict.len(), 2);
        assert!(!conflict.is_resolved());
        assert_eq!(state(&packages, "p1", "/app"), MappingState::Enabled);

        conflict.remove_mapping(&MappingKey::new("p2", "/app"), &mut packages).unwrap();
        assert!(conflict.is_resolved());
        assert!(conflict.is_empty());
        assert_eq!(state(&packages, "p3", "/app"), MappingState::Enabled);
    }

    #[test]
    fn test_remove_absent_mapping_is_noop() {
        let mut packages = loaded_packages(&["p1", "p2"]);
        let mut conflict = PathConflict::new(ConflictId::new(1), "/app");
        conflict.add_mapping(&MappingKey::new("p1", "/app"), &mut packages).unwrap();
        conflict.add_mapping(&MappingKey::new("p2", "/app"), &mut packages).unwrap();

        conflict
            .remove_mapping(&MappingKey::new("p1", "/app/css"), &mut packages)
            .unwrap();
        assert_eq!(conflict.len(), 2);
    }

    #[test]
    fn test_resolve_empties_conflict() {
        let mut packages = loaded_packages(&["p1", "p2"]);
        let mut conflict = PathConflict::new(ConflictId::new(1), "/app");
        conflict.add_mapping(&MappingKey::new("p1", "/app"), &mut packages).unwrap();
        conflict.add_mapping(&MappingKey::new("p2", "/app"), &mut packages).unwrap();

        conflict.resolve(&mut packages);
        assert!(conflict.is_resolved());
        assert_eq!(conflict.len(), 0);
        assert_eq!(state(&packages, "p1", "/app"), MappingState::Enabled);
        assert_eq!(state(&packages, "p2", "/app"), MappingState::Enabled);
    }

    #[test]
    fn test_unloaded_mapping_is_rejected() {
        let mut packages = loaded_packages(&["p1"]);
        packages
            .root_mut()
            .add_mapping(PathMapping::new("/app", &["res"]).unwrap());
        let mut conflict = PathConflict::new(ConflictId::new(1), "/app");

        let unloaded = MappingKey::new("root", "/app");
        assert!(matches!(
            conflict.add_mapping(&unloaded, &mut packages),
            Err(Error::NotLoaded { .. })
        ));
        assert!(matches!(
            conflict.remove_mapping(&unloaded, &mut packages),
            Err(Error::NotLoaded { .. })
        ));
        assert!(matches!(
            conflict.add_mapping(&MappingKey::new("nobody", "/app"), &mut packages),
            Err(Error::NotLoaded { .. })
        ));
    }

    #[test]
    fn test_index_prunes_resolved_conflicts() {
        let mut packages = loaded_packages(&["p1", "p2"]);
        let mut index = ConflictIndex::new();
        let id = {
            let conflict = index.create("/app");
            conflict.add_mapping(&MappingKey::new("p1", "/app"), &mut packages).unwrap();
            conflict.add_mapping(&MappingKey::new("p2", "/app"), &mut packages).unwrap();
            conflict.id()
        };
        index.create("/other");

        assert_eq!(index.unresolved().count(), 1);
        assert_eq!(index.ids_touching([&MappingKey::new("p2", "/app")]), vec![id]);

        index.prune();
        assert_eq!(index.len(), 1);

        index.clear(&mut packages);
        assert!(index.is_empty());
        assert_eq!(state(&packages, "p1", "/app"), MappingState::Enabled);
    }
}
