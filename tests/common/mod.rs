//! Shared test utilities for integration and E2E tests.
//!
//! This module provides fixtures for package directories on disk, helpers
//! that build package sets in memory, and test doubles for the repository
//! and the metadata store.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_root(packages::ROOT_WITH_BLOG)
//!         .with_package_dir("vendor/blog", packages::BLOG);
//!     // ... test code
//! }
//! ```

#![allow(dead_code)]

use assert_fs::prelude::*;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use resource_overlay::config::PackageFile;
use resource_overlay::error::{Error, Result};
use resource_overlay::mapping::PathMapping;
use resource_overlay::metadata::PackageMetadataStore;
use resource_overlay::package::{Package, PackageSet};
use resource_overlay::repository::{InMemoryRepository, Resource, ResourceRepository};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::packages;
    pub use super::TestFixture;
}

/// Package file snippets for testing.
pub mod packages {
    /// Root package installing a blog and a theme package.
    pub const ROOT_WITH_BLOG_AND_THEME: &str = r#"{
    "name": "acme/app",
    "resources": {
        "/app": "res"
    },
    "packages": {
        "acme/blog": { "install-path": "vendor/blog" },
        "acme/theme": { "install-path": "vendor/theme" }
    }
}"#;

    /// Root package with no installed packages.
    pub const ROOT_ALONE: &str = r#"{
    "name": "acme/app",
    "resources": {
        "/app": "res"
    }
}"#;

    /// Blog package mapping its CSS.
    pub const BLOG: &str = r#"{
    "name": "acme/blog",
    "resources": {
        "/acme/blog/css": "css"
    }
}"#;

    /// Theme package mapping the blog's CSS path without overriding the blog.
    pub const THEME: &str = r#"{
    "name": "acme/theme",
    "resources": {
        "/acme/blog/css": "css"
    }
}"#;

    /// Theme package overriding the blog.
    pub const THEME_OVERRIDING_BLOG: &str = r#"{
    "name": "acme/theme",
    "resources": {
        "/acme/blog/css": "css"
    },
    "override": "acme/blog"
}"#;

    /// Invalid JSON for error testing.
    pub const INVALID_JSON: &str = "{ \"name\": ";
}

/// A test fixture that provides a temporary root package directory.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_root(packages::ROOT_ALONE)
///     .with_file("res/index.html", "<html>");
///
/// fixture.command().arg("ls").assert().success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write the root `resources.json`.
    pub fn with_root(self, content: &str) -> Self {
        self.with_file("resources.json", content)
    }

    /// Write a package directory with its `resources.json`.
    pub fn with_package_dir(self, dir: &str, content: &str) -> Self {
        self.with_file(&format!("{}/resources.json", dir), content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Read the root package file back.
    pub fn root_file(&self) -> String {
        fs::read_to_string(self.path().join("resources.json")).expect("Failed to read root file")
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command for the binary, rooted at this fixture.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("resource-overlay");
        cmd.current_dir(self.path())
            .env_remove("RESOURCE_OVERLAY_ROOT")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a package whose mappings point at directories that exist.
///
/// Each mapping is `(repository path, reference)`; the referenced directory
/// is created below `base/name` unless the reference is a package reference.
pub fn package(base: &Path, name: &str, mappings: &[(&str, &str)], overrides: &[&str]) -> Package {
    let install_path = base.join(name);
    fs::create_dir_all(&install_path).expect("Failed to create install path");

    let mut package = Package::new(name, &install_path);
    for (repository_path, reference) in mappings {
        if !reference.starts_with('@') {
            let dir = install_path.join(reference);
            fs::create_dir_all(&dir).expect("Failed to create resource dir");
            fs::write(dir.join(format!("{}.txt", name.replace('/', "-"))), name)
                .expect("Failed to write resource");
        }
        package.add_mapping(PathMapping::new(repository_path, &[reference]).expect("valid mapping"));
    }
    for overridden in overrides {
        package.add_overridden_package(overridden);
    }
    package
}

/// Package set with a mapping-less root named `root` and the given packages.
pub fn package_set(base: &Path, packages: Vec<Package>) -> PackageSet {
    let mut set = PackageSet::new(Package::root("root", &base.join("root")));
    fs::create_dir_all(base.join("root")).expect("Failed to create root dir");
    for package in packages {
        set.add(package).expect("unique package names");
    }
    set
}

/// Metadata store recording every save.
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub saved: Rc<RefCell<Vec<PackageFile>>>,
}

impl RecordingStore {
    pub fn saves(&self) -> usize {
        self.saved.borrow().len()
    }

    pub fn last(&self) -> Option<PackageFile> {
        self.saved.borrow().last().cloned()
    }
}

impl PackageMetadataStore for RecordingStore {
    fn save(&mut self, metadata: &PackageFile) -> Result<()> {
        self.saved.borrow_mut().push(metadata.clone());
        Ok(())
    }
}

/// Metadata store that fails while `failing` is set.
#[derive(Default)]
pub struct FailingStore {
    pub failing: bool,
    pub attempts: usize,
}

impl PackageMetadataStore for FailingStore {
    fn save(&mut self, _metadata: &PackageFile) -> Result<()> {
        self.attempts += 1;
        if self.failing {
            return Err(Error::Persistence {
                message: "disk full".to_string(),
            });
        }
        Ok(())
    }
}

/// Repository that can be told to reject content from one package.
#[derive(Default)]
pub struct FlakyRepository {
    pub inner: InMemoryRepository,
    pub reject_package: Option<String>,
}

impl ResourceRepository for FlakyRepository {
    fn add(&mut self, path: &str, resource: Resource) -> Result<()> {
        if self.reject_package.as_deref() == Some(resource.package.as_str()) {
            return Err(Error::Filesystem {
                message: format!("cannot add {} from {}", path, resource.package),
            });
        }
        self.inner.add(path, resource)
    }

    fn remove(&mut self, path: &str) -> Result<()> {
        self.inner.remove(path)
    }

    fn clear(&mut self) -> Result<()> {
        self.inner.clear()
    }

    fn has_children(&self, path: &str) -> bool {
        self.inner.has_children(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_writes_root_file() {
        let fixture = TestFixture::new().with_root(packages::ROOT_ALONE);
        assert!(fixture.path().join("resources.json").exists());
        assert!(fixture.root_file().contains("acme/app"));
    }

    #[test]
    fn test_package_files_are_valid_json() {
        for content in [
            packages::ROOT_WITH_BLOG_AND_THEME,
            packages::ROOT_ALONE,
            packages::BLOG,
            packages::THEME,
            packages::THEME_OVERRIDING_BLOG,
        ] {
            serde_json::from_str::<serde_json::Value>(content).expect("valid JSON");
        }
        assert!(serde_json::from_str::<serde_json::Value>(packages::INVALID_JSON).is_err());
    }

    #[test]
    fn test_package_helper_creates_directories() {
        let temp = tempfile::TempDir::new().unwrap();
        let package = package(temp.path(), "p1", &[("/pkg", "resources")], &["p0"]);
        assert!(temp.path().join("p1/resources/p1.txt").exists());
        assert!(package.overridden_package_names().contains("p0"));
    }
}
