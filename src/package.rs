//! Packages and package sets
//!
//! A [`Package`] is a named, pre-installed directory that contributes path
//! mappings to the repository and may declare that its mappings override
//! those of other packages. A [`PackageSet`] holds every known package in
//! load order, indexed by name, with exactly one distinguished root package.
//!
//! The root package is the project being managed. Its package file also
//! records where the other packages are installed, and only its
//! `override-order` is honoured when resolving overrides.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::config::{self, InstallInfo, PackageFile, StringOrList};
use crate::defaults;
use crate::error::{Error, Result};
use crate::mapping::{MappingKey, PathMapping};

/// A named package with its path mappings
#[derive(Debug, Clone)]
pub struct Package {
    name: String,
    install_path: PathBuf,
    overridden_package_names: IndexSet<String>,
    override_order: Vec<String>,
    is_root: bool,
    mappings: IndexMap<String, PathMapping>,
}

impl Package {
    /// Create a non-root package with no mappings
    pub fn new(name: &str, install_path: &Path) -> Self {
        Self {
            name: name.to_string(),
            install_path: install_path.to_path_buf(),
            overridden_package_names: IndexSet::new(),
            override_order: Vec::new(),
            is_root: false,
            mappings: IndexMap::new(),
        }
    }

    /// Create a root package with no mappings
    pub fn root(name: &str, install_path: &Path) -> Self {
        Self {
            is_root: true,
            ..Self::new(name, install_path)
        }
    }

    /// Build a package from the contents of its package file
    ///
    /// `name` is used when the file does not declare one.
    pub fn from_package_file(
        name: &str,
        install_path: &Path,
        file: &PackageFile,
        is_root: bool,
    ) -> Result<Self> {
        let name = file.name.as_deref().unwrap_or(name);
        if name.trim().is_empty() {
            return Err(Error::PackageFile {
                path: install_path.display().to_string(),
                message: "the package has no name".to_string(),
                hint: Some("Add a \"name\" key to the package file".to_string()),
            });
        }

        let mut package = if is_root {
            Package::root(name, install_path)
        } else {
            Package::new(name, install_path)
        };

        for (repository_path, references) in &file.resources {
            let mapping = PathMapping::new(repository_path, &references.clone().into_vec())?;
            package.add_mapping(mapping);
        }
        for overridden in file.override_names() {
            package.add_overridden_package(&overridden);
        }
        package.override_order = file.override_order.clone();

        Ok(package)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn install_path(&self) -> &Path {
        &self.install_path
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    pub fn overridden_package_names(&self) -> &IndexSet<String> {
        &self.overridden_package_names
    }

    /// Declare that this package's mappings override `name`'s mappings
    pub fn add_overridden_package(&mut self, name: &str) -> bool {
        self.overridden_package_names.insert(name.to_string())
    }

    pub fn remove_overridden_package(&mut self, name: &str) -> bool {
        self.overridden_package_names.shift_remove(name)
    }

    /// Tie-break order declared by this package
    ///
    /// Only the root package's order is consulted by
    /// [`OverrideGraph`](crate::override_graph::OverrideGraph).
    pub fn override_order(&self) -> &[String] {
        &self.override_order
    }

    pub fn set_override_order(&mut self, order: Vec<String>) {
        self.override_order = order;
    }

    /// Mappings in declaration order
    pub fn mappings(&self) -> impl Iterator<Item = &PathMapping> {
        self.mappings.values()
    }

    pub fn mapping(&self, repository_path: &str) -> Option<&PathMapping> {
        self.mappings.get(repository_path)
    }

    pub(crate) fn mapping_mut(&mut self, repository_path: &str) -> Option<&mut PathMapping> {
        self.mappings.get_mut(repository_path)
    }

    pub fn has_mapping(&self, repository_path: &str) -> bool {
        self.mappings.contains_key(repository_path)
    }

    /// Add a mapping, replacing and returning any mapping at the same path
    pub fn add_mapping(&mut self, mapping: PathMapping) -> Option<PathMapping> {
        let repository_path = mapping.repository_path().to_string();
        let previous = self.mappings.shift_remove(&repository_path);
        self.mappings.insert(repository_path, mapping);
        previous
    }

    pub fn remove_mapping(&mut self, repository_path: &str) -> Option<PathMapping> {
        self.mappings.shift_remove(repository_path)
    }

    /// Package file contents describing this package's own declarations
    pub fn to_package_file(&self) -> PackageFile {
        PackageFile {
            name: Some(self.name.clone()),
            resources: self
                .mappings
                .values()
                .map(|mapping| {
                    (
                        mapping.repository_path().to_string(),
                        StringOrList::from_vec(mapping.reference_strings()),
                    )
                })
                .collect(),
            overrides: if self.overridden_package_names.is_empty() {
                None
            } else {
                Some(StringOrList::from_vec(
                    self.overridden_package_names.iter().cloned().collect(),
                ))
            },
            override_order: self.override_order.clone(),
            packages: IndexMap::new(),
        }
    }
}

/// Every known package, in load order, with one root package
#[derive(Debug, Clone)]
pub struct PackageSet {
    packages: IndexMap<String, Package>,
    root: String,
}

impl PackageSet {
    /// Create a set holding only the root package
    pub fn new(mut root: Package) -> Self {
        root.is_root = true;
        let name = root.name.clone();
        let mut packages = IndexMap::new();
        packages.insert(name.clone(), root);
        Self {
            packages,
            root: name,
        }
    }

    /// Load the root package from `root_dir` and every package it installs
    ///
    /// Relative install paths are resolved against `root_dir`. An installed
    /// package without a package file contributes no mappings.
    pub fn load(root_dir: &Path) -> Result<Self> {
        let root_file_path = defaults::find_package_file(root_dir).ok_or_else(|| Error::PackageFile {
            path: root_dir.join(defaults::DEFAULT_PACKAGE_FILENAME).display().to_string(),
            message: "the root package file does not exist".to_string(),
            hint: Some("Create a resources.json file with at least a \"name\" key".to_string()),
        })?;
        let root_file = config::from_file(&root_file_path)?;
        if root_file.name.is_none() {
            return Err(Error::PackageFile {
                path: root_file_path.display().to_string(),
                message: "the root package has no name".to_string(),
                hint: Some("Add a \"name\" key to the root package file".to_string()),
            });
        }

        let root = Package::from_package_file("", root_dir, &root_file, true)?;
        let mut packages = PackageSet::new(root);

        for (name, info) in &root_file.packages {
            let install_path = if info.install_path.is_absolute() {
                info.install_path.clone()
            } else {
                root_dir.join(&info.install_path)
            };

            let package = match defaults::find_package_file(&install_path) {
                Some(file_path) => {
                    let file = config::from_file(&file_path)?;
                    let mut package = Package::from_package_file(name, &install_path, &file, false)?;
                    // The root decides what an installed package is called.
                    package.name = name.clone();
                    package
                }
                None => Package::new(name, &install_path),
            };

            debug!(
                "Loaded package {} from {} ({} mappings)",
                package.name(),
                install_path.display(),
                package.mappings.len()
            );
            packages.add(package)?;
        }

        Ok(packages)
    }

    /// Add a non-root package
    pub fn add(&mut self, mut package: Package) -> Result<()> {
        if self.packages.contains_key(&package.name) {
            return Err(Error::InvalidOperation {
                message: format!("the package \"{}\" is already installed", package.name),
            });
        }
        package.is_root = false;
        self.packages.insert(package.name.clone(), package);
        Ok(())
    }

    /// Remove a non-root package
    pub fn remove(&mut self, name: &str) -> Result<Package> {
        if name == self.root {
            return Err(Error::InvalidOperation {
                message: "the root package cannot be removed".to_string(),
            });
        }
        self.packages
            .shift_remove(name)
            .ok_or_else(|| Error::NoSuchPackage {
                name: name.to_string(),
            })
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Package> {
        self.packages.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn root(&self) -> &Package {
        &self.packages[&self.root]
    }

    pub fn root_mut(&mut self) -> &mut Package {
        let root = self.root.clone();
        &mut self.packages[&root]
    }

    pub fn root_name(&self) -> &str {
        &self.root
    }

    /// Packages in load order
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn mapping(&self, key: &MappingKey) -> Option<&PathMapping> {
        self.packages
            .get(&key.package)
            .and_then(|package| package.mapping(&key.repository_path))
    }

    pub(crate) fn mapping_mut(&mut self, key: &MappingKey) -> Option<&mut PathMapping> {
        self.packages
            .get_mut(&key.package)
            .and_then(|package| package.mapping_mut(&key.repository_path))
    }

    /// Every mapping of every package, in load order
    pub fn mappings(&self) -> impl Iterator<Item = (&Package, &PathMapping)> {
        self.packages
            .values()
            .flat_map(|package| package.mappings().map(move |mapping| (package, mapping)))
    }

    /// Metadata to persist for the root package, including install paths
    ///
    /// Install paths below the root directory are written relative to it.
    pub fn root_metadata(&self) -> PackageFile {
        let root = self.root();
        let mut file = root.to_package_file();
        file.packages = self
            .packages
            .values()
            .filter(|package| !package.is_root)
            .map(|package| {
                let install_path = package
                    .install_path
                    .strip_prefix(&root.install_path)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| package.install_path.clone());
                (package.name.clone(), InstallInfo { install_path })
            })
            .collect();
        file
    }
}
