//! Persistence of root package metadata
//!
//! After every successful in-memory change to the root package, the
//! repository builder hands the root package's metadata to a
//! [`PackageMetadataStore`]. If the store fails, the builder rolls back the
//! change; it never calls the store again during that rollback.

use std::path::{Path, PathBuf};

use log::debug;

use crate::config::{self, PackageFile};
use crate::defaults;
use crate::error::{Error, Result};

/// Saves the root package's metadata
pub trait PackageMetadataStore {
    fn save(&mut self, metadata: &PackageFile) -> Result<()>;
}

/// Store writing the root package file to disk
#[derive(Debug, Clone)]
pub struct FileMetadataStore {
    path: PathBuf,
}

impl FileMetadataStore {
    /// Store writing to a specific file; the extension picks JSON or YAML
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Store writing to the package file of a package directory
    pub fn for_package_dir(package_dir: &Path) -> Self {
        Self::new(&defaults::package_file_path(package_dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PackageMetadataStore for FileMetadataStore {
    fn save(&mut self, metadata: &PackageFile) -> Result<()> {
        debug!("Writing package file {}", self.path.display());
        config::to_file(&self.path, metadata).map_err(|e| Error::Persistence {
            message: format!("{}: {}", self.path.display(), e),
        })
    }
}

/// Store that keeps nothing, for repositories that are never persisted
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMetadataStore;

impl PackageMetadataStore for NullMetadataStore {
    fn save(&mut self, _metadata: &PackageFile) -> Result<()> {
        Ok(())
    }
}
