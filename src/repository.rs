//! # Virtual Resource Repository
//!
//! The repository builder writes into a virtual resource tree through the
//! [`ResourceRepository`] trait, which keeps the builder independent of
//! where the tree lives. The trait is deliberately small: `add`, `remove`,
//! `clear` and `has_children`.
//!
//! Adds follow "last add wins" overlay semantics. A later add at a path, or
//! at one of its ancestors, shadows the content of earlier adds wherever
//! both provide a resource. The builder relies on this to apply overrides:
//! it adds the overridden mapping first and the overriding one after it.
//!
//! [`InMemoryRepository`] is the implementation used by the CLI and the
//! tests. It keeps the add log in memory and resolves lookups against the
//! local filesystem on demand.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::error::Result;
use crate::path;

/// Content added to the repository for one mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Package that contributed the content
    pub package: String,
    /// Local files or directories, later ones shadowing earlier ones
    pub sources: Vec<PathBuf>,
}

impl Resource {
    pub fn new(package: &str, sources: Vec<PathBuf>) -> Self {
        Self {
            package: package.to_string(),
            sources,
        }
    }
}

/// Destination tree written by the repository builder
pub trait ResourceRepository {
    /// Add a resource at a path, shadowing earlier content
    fn add(&mut self, path: &str, resource: Resource) -> Result<()>;

    /// Remove everything added at a path or below it
    fn remove(&mut self, path: &str) -> Result<()>;

    /// Remove everything
    fn clear(&mut self) -> Result<()>;

    /// Whether anything lives below a path
    fn has_children(&self, path: &str) -> bool;
}

/// One add recorded by [`InMemoryRepository`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryEntry {
    pub path: String,
    pub resource: Resource,
}

/// Repository keeping its add log in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    entries: Vec<RepositoryEntry>,
}

impl InMemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds in the order they were made
    pub fn entries(&self) -> &[RepositoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Local file or directory backing a repository path
    ///
    /// The newest add whose path equals or contains `path` and whose source
    /// has the remainder wins. Among the sources of one add, later sources win.
    pub fn get(&self, path: &str) -> Option<PathBuf> {
        for entry in self.entries.iter().rev() {
            let Some(relative) = path::relative_to(&entry.path, path) else {
                continue;
            };
            for source in entry.resource.sources.iter().rev() {
                let candidate = if relative.is_empty() {
                    source.clone()
                } else {
                    source.join(relative)
                };
                if candidate.exists() {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Whether a path is backed by a resource or leads to one
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
            || self
                .entries
                .iter()
                .any(|entry| path::is_ancestor_or_self(path, &entry.path))
    }

    /// Direct children of a path, sorted
    pub fn list(&self, path: &str) -> Vec<String> {
        let mut children = BTreeSet::new();

        for entry in &self.entries {
            if entry.path != path && path::is_ancestor_or_self(path, &entry.path) {
                let below = path::relative_to(path, &entry.path).unwrap_or_default();
                if let Some(first) = below.split('/').next() {
                    children.insert(path::join(path, first));
                }
                continue;
            }

            let Some(relative) = path::relative_to(&entry.path, path) else {
                continue;
            };
            for source in &entry.resource.sources {
                let dir = if relative.is_empty() {
                    source.clone()
                } else {
                    source.join(relative)
                };
                let Ok(read_dir) = fs::read_dir(&dir) else {
                    continue;
                };
                for child in read_dir.flatten() {
                    if let Some(name) = child.file_name().to_str() {
                        children.insert(path::join(path, name));
                    }
                }
            }
        }

        children.into_iter().collect()
    }

    /// Every file below a path, sorted
    pub fn walk(&self, path: &str) -> Vec<String> {
        let mut candidates = BTreeSet::new();

        for entry in &self.entries {
            // Content of adds at or above `path` is walked from the matching
            // subdirectory; adds below `path` are walked from their root.
            let (base, relative) = if let Some(relative) = path::relative_to(&entry.path, path) {
                (path.to_string(), relative.to_string())
            } else if path::is_ancestor_or_self(path, &entry.path) {
                (entry.path.clone(), String::new())
            } else {
                continue;
            };

            for source in &entry.resource.sources {
                let root = if relative.is_empty() {
                    source.clone()
                } else {
                    source.join(&relative)
                };
                for file in WalkDir::new(&root).into_iter().flatten() {
                    if !file.file_type().is_file() {
                        continue;
                    }
                    let Ok(below) = file.path().strip_prefix(&root) else {
                        continue;
                    };
                    let below = below.to_string_lossy().replace('\\', "/");
                    candidates.insert(path::join(&base, &below));
                }
            }
        }

        candidates
            .into_iter()
            .filter(|candidate| self.get(candidate).is_some_and(|local| local.is_file()))
            .collect()
    }
}

impl ResourceRepository for InMemoryRepository {
    fn add(&mut self, path: &str, resource: Resource) -> Result<()> {
        self.entries.push(RepositoryEntry {
            path: path::normalize(path)?,
            resource,
        });
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<()> {
        let path = path::normalize(path)?;
        self.entries
            .retain(|entry| !path::is_ancestor_or_self(&path, &entry.path));
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }

    fn has_children(&self, path: &str) -> bool {
        let Ok(path) = path::normalize(path) else {
            return false;
        };
        self.entries
            .iter()
            .any(|entry| path::is_ancestor_or_self(&path, &entry.path))
            || !self.list(&path).is_empty()
    }
}
