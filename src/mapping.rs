//! Path mappings
//!
//! A [`PathMapping`] is one package's declaration that a repository path is
//! backed by one or more path references. The mapping owns its lifecycle
//! state and the set of conflicts it currently takes part in. That set is a
//! relation kept in sync by [`PathConflict`](crate::conflict::PathConflict),
//! which is the only code that links or unlinks a mapping.

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexSet;

use crate::conflict::ConflictId;
use crate::error::{Error, Result};
use crate::path;
use crate::reference::{PathReference, Resolution};

/// Lifecycle state of a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingState {
    /// Not loaded yet, or unloaded again.
    Unloaded,
    /// Loaded and contributing to the repository.
    Enabled,
    /// Loaded, but none of its references resolved to a local path.
    NotFound,
    /// Loaded, but contending with another package's mapping.
    Conflict,
}

impl fmt::Display for MappingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MappingState::Unloaded => "unloaded",
            MappingState::Enabled => "enabled",
            MappingState::NotFound => "not-found",
            MappingState::Conflict => "conflict",
        };
        f.write_str(name)
    }
}

/// Stable identifier of a mapping: a package maps each repository path at most once
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MappingKey {
    pub package: String,
    pub repository_path: String,
}

impl MappingKey {
    pub fn new(package: &str, repository_path: &str) -> Self {
        Self {
            package: package.to_string(),
            repository_path: repository_path.to_string(),
        }
    }
}

impl fmt::Display for MappingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.repository_path, self.package)
    }
}

/// Maps a repository path to one or more path references
#[derive(Debug, Clone)]
pub struct PathMapping {
    repository_path: String,
    path_references: Vec<PathReference>,
    state: MappingState,
    containing_package: Option<String>,
    sources: Vec<PathBuf>,
    load_errors: Vec<String>,
    conflicts: IndexSet<ConflictId>,
}

impl PathMapping {
    /// Create an unloaded mapping
    ///
    /// The repository path is normalized. Fails with
    /// [`Error::ResourceDefinition`] if no reference is given or a reference
    /// is malformed.
    pub fn new<S: AsRef<str>>(repository_path: &str, path_references: &[S]) -> Result<Self> {
        let repository_path = path::normalize(repository_path)?;

        if path_references.is_empty() {
            return Err(Error::ResourceDefinition {
                reference: String::new(),
                message: format!("the mapping for \"{}\" has no path references", repository_path),
            });
        }

        let path_references = path_references
            .iter()
            .map(|reference| PathReference::parse(reference.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            repository_path,
            path_references,
            state: MappingState::Unloaded,
            containing_package: None,
            sources: Vec::new(),
            load_errors: Vec::new(),
            conflicts: IndexSet::new(),
        })
    }

    pub fn repository_path(&self) -> &str {
        &self.repository_path
    }

    pub fn path_references(&self) -> &[PathReference] {
        &self.path_references
    }

    pub fn state(&self) -> MappingState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state != MappingState::Unloaded
    }

    pub fn is_enabled(&self) -> bool {
        self.state == MappingState::Enabled
    }

    pub fn is_conflicting(&self) -> bool {
        self.state == MappingState::Conflict
    }

    /// Name of the package the mapping was loaded for
    pub fn containing_package(&self) -> Option<&str> {
        self.containing_package.as_deref()
    }

    /// Local paths the references resolved to, in declaration order
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Problems met while resolving references in tolerant mode
    pub fn load_errors(&self) -> &[String] {
        &self.load_errors
    }

    /// Conflicts the mapping currently takes part in
    pub fn conflict_ids(&self) -> impl Iterator<Item = ConflictId> + '_ {
        self.conflicts.iter().copied()
    }

    /// Key of a loaded mapping
    pub fn key(&self) -> Option<MappingKey> {
        self.containing_package
            .as_deref()
            .map(|package| MappingKey::new(package, &self.repository_path))
    }

    /// References as they appear in a package file
    pub fn reference_strings(&self) -> Vec<String> {
        self.path_references.iter().map(ToString::to_string).collect()
    }

    /// Whether the loaded mapping has content to contribute
    pub(crate) fn has_sources(&self) -> bool {
        self.is_loaded() && !self.sources.is_empty()
    }

    pub(crate) fn load(&mut self, package: &str, resolution: Resolution) {
        self.containing_package = Some(package.to_string());
        self.sources = resolution.sources;
        self.load_errors = resolution.errors;
        self.conflicts.clear();
        self.state = if self.sources.is_empty() {
            MappingState::NotFound
        } else {
            MappingState::Enabled
        };
    }

    pub(crate) fn unload(&mut self) {
        self.containing_package = None;
        self.sources.clear();
        self.load_errors.clear();
        self.conflicts.clear();
        self.state = MappingState::Unloaded;
    }

    pub(crate) fn link_conflict(&mut self, id: ConflictId) {
        self.conflicts.insert(id);
        if self.is_loaded() {
            self.state = MappingState::Conflict;
        }
    }

    pub(crate) fn unlink_conflict(&mut self, id: ConflictId) {
        self.conflicts.shift_remove(&id);
        if self.conflicts.is_empty() && self.state == MappingState::Conflict {
            self.state = if self.sources.is_empty() {
                MappingState::NotFound
            } else {
                MappingState::Enabled
            };
        }
    }
}
