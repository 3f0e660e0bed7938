//! # Package File Schema and Parsing
//!
//! This module defines the data structures that represent a package file
//! (`resources.json`, or `resources.yaml`) and the logic for reading and
//! writing it. A package file declares the path mappings a package
//! contributes to the shared repository and the packages it overrides:
//!
//! ```json
//! {
//!     "name": "acme/blog",
//!     "resources": {
//!         "/acme/blog": "res",
//!         "/acme/blog/css": ["css", "@?acme/theme:css"]
//!     },
//!     "override": "acme/base",
//!     "override-order": ["acme/base", "acme/theme"],
//!     "packages": {
//!         "acme/base": { "install-path": "vendor/acme/base" }
//!     }
//! }
//! ```
//!
//! `override-order` and `packages` are only meaningful in the root package
//! file. The format (JSON or YAML) is chosen from the file extension, and a
//! file is written back in the format it was read from.
//!
//! This module also holds [`BuildMode`], the one knob that changes how the
//! repository builder treats unresolvable references and conflicts.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How strictly the repository builder treats problems it can work around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Missing local paths and unknown optional packages degrade mappings to
    /// `NotFound`; conflicts are excluded from the tree and reported.
    #[default]
    Tolerant,
    /// Missing local paths, unknown packages and unresolved conflicts are
    /// returned as errors before the tree is touched.
    Strict,
}

/// A single string or a list of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    /// Flatten into a list
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StringOrList::One(value) => vec![value],
            StringOrList::Many(values) => values,
        }
    }

    /// Build the most compact representation of a list
    pub fn from_vec(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            StringOrList::One(values.remove(0))
        } else {
            StringOrList::Many(values)
        }
    }
}

/// Install information of a package, as recorded in the root package file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstallInfo {
    /// Install path, relative to the root package directory or absolute
    #[serde(rename = "install-path")]
    pub install_path: PathBuf,
}

/// Contents of a package file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageFile {
    /// Package name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Repository path to path reference(s)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub resources: IndexMap<String, StringOrList>,

    /// Names of the packages whose mappings this package overrides
    #[serde(default, rename = "override", skip_serializing_if = "Option::is_none")]
    pub overrides: Option<StringOrList>,

    /// Tie-break order for packages with no override relation (root only)
    #[serde(default, rename = "override-order", skip_serializing_if = "Vec::is_empty")]
    pub override_order: Vec<String>,

    /// Installed packages (root only)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub packages: IndexMap<String, InstallInfo>,
}

impl PackageFile {
    /// Overridden package names as a list
    pub fn override_names(&self) -> Vec<String> {
        self.overrides.clone().map(StringOrList::into_vec).unwrap_or_default()
    }
}

/// Serialization format of a package file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Pick the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Format::Yaml,
            _ => Format::Json,
        }
    }
}

/// Parse package file content
pub fn parse(content: &str, format: Format) -> Result<PackageFile> {
    let file: PackageFile = match format {
        Format::Json => serde_json::from_str(content)?,
        Format::Yaml => serde_yaml::from_str(content)?,
    };
    validate(&file)?;
    Ok(file)
}

/// Serialize a package file
pub fn to_string(file: &PackageFile, format: Format) -> Result<String> {
    match format {
        Format::Json => {
            let mut content = serde_json::to_string_pretty(file)?;
            content.push('\n');
            Ok(content)
        }
        Format::Yaml => Ok(serde_yaml::to_string(file)?),
    }
}

/// Read and parse a package file from disk
pub fn from_file(path: &Path) -> Result<PackageFile> {
    let content = fs::read_to_string(path)?;
    parse(&content, Format::from_path(path)).map_err(|e| match e {
        Error::PackageFile { message, hint, .. } => Error::PackageFile {
            path: path.display().to_string(),
            message,
            hint,
        },
        other => Error::PackageFile {
            path: path.display().to_string(),
            message: other.to_string(),
            hint: Some("Check the file against the package file format".to_string()),
        },
    })
}

/// Write a package file to disk
pub fn to_file(path: &Path, file: &PackageFile) -> Result<()> {
    let content = to_string(file, Format::from_path(path))?;
    fs::write(path, content)?;
    Ok(())
}

fn validate(file: &PackageFile) -> Result<()> {
    if let Some(name) = &file.name {
        if name.trim().is_empty() {
            return Err(invalid("the package name must not be empty", None));
        }
    }

    for (path, references) in &file.resources {
        let empty = match references {
            StringOrList::One(reference) => reference.is_empty(),
            StringOrList::Many(list) => list.is_empty(),
        };
        if empty {
            return Err(invalid(
                &format!("the mapping for \"{}\" has no path references", path),
                Some("Map the path to a directory, e.g. \"res\" or \"@vendor/package:res\""),
            ));
        }
    }

    Ok(())
}

fn invalid(message: &str, hint: Option<&str>) -> Error {
    Error::PackageFile {
        path: "<input>".to_string(),
        message: message.to_string(),
        hint: hint.map(str::to_string),
    }
}
