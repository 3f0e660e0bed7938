//! Transactional application of incremental changes
//!
//! A change runs against a [`Snapshot`] of the builder's state taken before
//! the package set was touched. Committing replans the affected region,
//! updates the conflict index, applies the tree delta and persists the root
//! package. When any of these fail, the tree is put back the way it was
//! (every path the change touched is cleared and the region's previous adds
//! are replayed in order) and the snapshot is restored.

use log::{debug, error, warn};

use super::{candidates_of, plan, RepositoryBuilder, TreeEntry, TreeOp};
use crate::conflict::ConflictIndex;
use crate::error::Result;
use crate::mapping::MappingKey;
use crate::metadata::PackageMetadataStore;
use crate::override_graph::OverrideGraph;
use crate::package::PackageSet;
use crate::path;
use crate::repository::ResourceRepository;

/// Builder state to fall back to
pub(crate) struct Snapshot {
    packages: PackageSet,
    conflicts: ConflictIndex,
    entries: Vec<TreeEntry>,
}

/// Part of the repository a change may affect
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Region {
    /// Mappings overlapping any of these paths, closed under overlap
    Paths(Vec<String>),
    /// Every mapping
    All,
}

impl Region {
    /// Grow the region until no mapping outside it overlaps a mapping inside
    fn close<'a, I>(self, keys: I) -> Region
    where
        I: IntoIterator<Item = &'a MappingKey>,
    {
        let Region::Paths(mut paths) = self else {
            return Region::All;
        };

        let mut pending: Vec<&str> = keys
            .into_iter()
            .map(|key| key.repository_path.as_str())
            .collect();

        loop {
            let (inside, outside): (Vec<&str>, Vec<&str>) = pending
                .into_iter()
                .partition(|candidate| paths.iter().any(|path| path::overlaps(path, candidate)));
            if inside.is_empty() {
                break;
            }
            paths.extend(inside.into_iter().map(str::to_string));
            pending = outside;
        }

        Region::Paths(paths)
    }

    fn contains(&self, repository_path: &str) -> bool {
        match self {
            Region::All => true,
            Region::Paths(paths) => paths
                .iter()
                .any(|path| path::overlaps(path, repository_path)),
        }
    }
}

/// Smallest set of paths covering every given path, shallowest first
fn minimal_paths<'a, I>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sorted: Vec<&str> = paths.into_iter().collect();
    sorted.sort_by_key(|path| (path::depth(path), *path));
    sorted.dedup();

    let mut minimal: Vec<String> = Vec::new();
    for path in sorted {
        if !minimal
            .iter()
            .any(|ancestor| path::is_ancestor_or_self(ancestor, path))
        {
            minimal.push(path.to_string());
        }
    }
    minimal
}

impl<R: ResourceRepository, S: PackageMetadataStore> RepositoryBuilder<R, S> {
    pub(super) fn snapshot(&self) -> Snapshot {
        Snapshot {
            packages: self.packages.clone(),
            conflicts: self.conflicts.clone(),
            entries: self.entries.clone(),
        }
    }

    pub(super) fn restore(&mut self, snapshot: Snapshot) {
        self.packages = snapshot.packages;
        self.conflicts = snapshot.conflicts;
        self.entries = snapshot.entries;
    }

    /// Replan a region after the package set changed, then persist
    ///
    /// On failure the repository and the builder are back in the state
    /// captured by `snapshot`, and the error is returned as is.
    pub(super) fn commit(&mut self, snapshot: Snapshot, region: Region) -> Result<Vec<TreeOp>> {
        let old_candidates = candidates_of(&snapshot.packages);
        let new_candidates = self.candidates();
        let region = region.close(old_candidates.iter().chain(new_candidates.iter()));

        let in_region = |key: &MappingKey| region.contains(&key.repository_path);
        let mut touched: Vec<MappingKey> = old_candidates.into_iter().filter(in_region).collect();
        let new_keys: Vec<MappingKey> = new_candidates.into_iter().filter(in_region).collect();
        touched.extend(new_keys.iter().cloned());

        let graph = OverrideGraph::new(&self.packages);
        let plan = plan::plan(&new_keys, &graph);

        let new_entries = self
            .sync_conflicts(&touched, &plan.clusters)
            .and_then(|()| {
                plan.enabled
                    .into_iter()
                    .map(|key| self.entry_for(key))
                    .collect::<Result<Vec<_>>>()
            });
        let new_entries = match new_entries {
            Ok(entries) => entries,
            Err(e) => {
                self.restore(snapshot);
                return Err(e);
            }
        };

        let old_entries: Vec<TreeEntry> = self
            .entries
            .iter()
            .filter(|entry| region.contains(&entry.key.repository_path))
            .cloned()
            .collect();

        let mut journal = Vec::new();
        let result = self
            .apply_delta(&old_entries, new_entries, &mut journal)
            .and_then(|()| {
                let metadata = self.packages.root_metadata();
                self.store.save(&metadata)
            });

        match result {
            Ok(()) => {
                debug!("Committed {} tree changes", journal.len());
                Ok(journal)
            }
            Err(e) => {
                self.rollback(&journal, &old_entries);
                self.restore(snapshot);
                Err(e)
            }
        }
    }

    /// Bring the region's adds from `old` to `new`
    ///
    /// When the old adds are a prefix of the new ones only the rest is added.
    /// Otherwise the region is cleared and added again in the new order.
    fn apply_delta(
        &mut self,
        old: &[TreeEntry],
        new: Vec<TreeEntry>,
        journal: &mut Vec<TreeOp>,
    ) -> Result<()> {
        if new.starts_with(old) {
            for entry in new.into_iter().skip(old.len()) {
                self.add_entry(entry, journal)?;
            }
            return Ok(());
        }

        let cleared = minimal_paths(old.iter().map(|entry| entry.key.repository_path.as_str()));
        for path in &cleared {
            self.remove_path(path, journal)?;
        }
        for entry in new {
            self.add_entry(entry, journal)?;
        }
        Ok(())
    }

    pub(super) fn add_entry(&mut self, entry: TreeEntry, journal: &mut Vec<TreeOp>) -> Result<()> {
        let path = entry.key.repository_path.clone();
        self.repo.add(&path, entry.resource.clone())?;
        debug!("Added {} from {}", path, entry.resource.package);

        journal.push(TreeOp::Add {
            path,
            resource: entry.resource.clone(),
        });
        self.entries.push(entry);
        Ok(())
    }

    fn remove_path(&mut self, path: &str, journal: &mut Vec<TreeOp>) -> Result<()> {
        self.repo.remove(path)?;
        debug!("Removed {}", path);

        self.entries
            .retain(|entry| !path::is_ancestor_or_self(path, &entry.key.repository_path));
        journal.push(TreeOp::Remove {
            path: path.to_string(),
        });
        Ok(())
    }

    /// Undo a partially applied delta
    ///
    /// Failures are logged and skipped so that as much as possible is restored.
    fn rollback(&mut self, journal: &[TreeOp], old: &[TreeEntry]) {
        warn!("Rolling back {} tree changes", journal.len());

        let touched = minimal_paths(
            journal
                .iter()
                .map(TreeOp::path)
                .chain(old.iter().map(|entry| entry.key.repository_path.as_str())),
        );
        for path in touched.iter().rev() {
            if let Err(e) = self.repo.remove(path) {
                error!("Rollback could not remove {}: {}", path, e);
            }
        }

        for entry in old {
            if let Err(e) = self
                .repo
                .add(&entry.key.repository_path, entry.resource.clone())
            {
                error!("Rollback could not restore {}: {}", entry.key, e);
            }
        }
    }
}
