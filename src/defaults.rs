//! Default values for resource-overlay configuration.
//!
//! This module provides centralized default values used across the library
//! and the CLI, ensuring consistency and avoiding duplication.

use std::path::{Path, PathBuf};

/// Default name of a package file.
pub const DEFAULT_PACKAGE_FILENAME: &str = "resources.json";

/// Package file names accepted in a package directory, in lookup order.
pub const PACKAGE_FILENAMES: &[&str] = &[DEFAULT_PACKAGE_FILENAME, "resources.yaml", "resources.yml"];

/// Environment variable that sets the root package directory for the CLI.
pub const ROOT_DIR_ENV: &str = "RESOURCE_OVERLAY_ROOT";

/// Locate the package file inside a package directory.
///
/// Returns the first existing file from [`PACKAGE_FILENAMES`], or `None` if
/// the directory has no package file.
pub fn find_package_file(package_dir: &Path) -> Option<PathBuf> {
    PACKAGE_FILENAMES
        .iter()
        .map(|name| package_dir.join(name))
        .find(|path| path.is_file())
}

/// Package file path to use for a directory, existing or not.
///
/// Falls back to [`DEFAULT_PACKAGE_FILENAME`] when no package file exists.
pub fn package_file_path(package_dir: &Path) -> PathBuf {
    find_package_file(package_dir).unwrap_or_else(|| package_dir.join(DEFAULT_PACKAGE_FILENAME))
}
