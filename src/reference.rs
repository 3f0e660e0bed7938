//! Path references and their resolution to local paths
//!
//! A path reference is one of:
//!
//! - `<relative/path>`: relative to the install path of the owning package,
//! - `@<package>:<relative/path>`: relative to another package's install path,
//! - `@?<package>:<relative/path>`: like the above, but optional. If the
//!   package is not installed the reference resolves to nothing instead of
//!   failing.

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::BuildMode;
use crate::error::{Error, Result};
use crate::package::PackageSet;

static PACKAGE_REFERENCE: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^@(\?)?([^:?][^:]*):(.*)$"));

/// A parsed path reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathReference {
    /// Path relative to the owning package
    Local(String),
    /// Path relative to a named package
    Package {
        package: String,
        path: String,
        optional: bool,
    },
}

impl PathReference {
    /// Parse a reference string
    pub fn parse(reference: &str) -> Result<Self> {
        if reference.is_empty() {
            return Err(definition_error(reference, "the reference is empty"));
        }

        if !reference.starts_with('@') {
            return Ok(PathReference::Local(reference.to_string()));
        }

        let pattern = PACKAGE_REFERENCE
            .as_ref()
            .map_err(|e| Error::Regex(e.clone()))?;
        let captures = pattern.captures(reference).ok_or_else(|| {
            definition_error(reference, "expected \"@<package>:<path>\" or \"@?<package>:<path>\"")
        })?;

        Ok(PathReference::Package {
            optional: captures.get(1).is_some(),
            package: captures[2].to_string(),
            path: captures[3].to_string(),
        })
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, PathReference::Package { optional: true, .. })
    }
}

impl fmt::Display for PathReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathReference::Local(path) => f.write_str(path),
            PathReference::Package {
                package,
                path,
                optional,
            } => write!(f, "@{}{}:{}", if *optional { "?" } else { "" }, package, path),
        }
    }
}

fn definition_error(reference: &str, message: &str) -> Error {
    Error::ResourceDefinition {
        reference: reference.to_string(),
        message: message.to_string(),
    }
}

/// Outcome of resolving a single reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// The reference points to an existing local path.
    Found(PathBuf),
    /// The reference points nowhere; the reason is kept for reporting.
    NotFound(String),
}

/// Outcome of resolving every reference of a mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Existing local paths, in declaration order
    pub sources: Vec<PathBuf>,
    /// Why the remaining references did not resolve
    pub errors: Vec<String>,
}

/// Turns path references into local filesystem paths
pub struct ReferenceResolver<'a> {
    packages: &'a PackageSet,
    mode: BuildMode,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(packages: &'a PackageSet, mode: BuildMode) -> Self {
        Self { packages, mode }
    }

    /// Resolve one reference owned by `owner`
    ///
    /// Unknown non-optional packages fail with [`Error::NoSuchPackage`]. In
    /// strict mode an unknown optional package fails with
    /// [`Error::ResourceDefinition`] and a missing local path with
    /// [`Error::Filesystem`]; in tolerant mode both resolve to
    /// [`Resolved::NotFound`].
    pub fn resolve(&self, reference: &PathReference, owner: &str) -> Result<Resolved> {
        let (package_name, relative) = match reference {
            PathReference::Local(path) => (owner, path.as_str()),
            PathReference::Package {
                package,
                path,
                optional,
            } => {
                if !self.packages.contains(package) {
                    if !optional {
                        return Err(Error::NoSuchPackage {
                            name: package.clone(),
                        });
                    }
                    if self.mode == BuildMode::Strict {
                        return Err(definition_error(
                            &reference.to_string(),
                            &format!("the optional package \"{}\" is not installed", package),
                        ));
                    }
                    return Ok(Resolved::NotFound(format!(
                        "The optional package \"{}\" is not installed",
                        package
                    )));
                }
                (package.as_str(), path.as_str())
            }
        };

        let install_path = self
            .packages
            .get(package_name)
            .map(|package| package.install_path())
            .ok_or_else(|| Error::NoSuchPackage {
                name: package_name.to_string(),
            })?;

        let local_path = if relative.is_empty() {
            install_path.to_path_buf()
        } else {
            install_path.join(relative)
        };

        if local_path.exists() {
            return Ok(Resolved::Found(local_path));
        }

        let message = format!(
            "The path \"{}\" referenced by \"{}\" does not exist",
            local_path.display(),
            reference
        );
        match self.mode {
            BuildMode::Strict => Err(Error::Filesystem { message }),
            BuildMode::Tolerant => Ok(Resolved::NotFound(message)),
        }
    }

    /// Resolve every reference of a mapping
    ///
    /// With `fail_on_error` the first error is returned; otherwise errors are
    /// recorded in the resolution and the remaining references are still tried.
    pub fn resolve_all(
        &self,
        references: &[PathReference],
        owner: &str,
        fail_on_error: bool,
    ) -> Result<Resolution> {
        let mut resolution = Resolution::default();

        for reference in references {
            match self.resolve(reference, owner) {
                Ok(Resolved::Found(path)) => resolution.sources.push(path),
                Ok(Resolved::NotFound(reason)) => resolution.errors.push(reason),
                Err(e) if fail_on_error => return Err(e),
                Err(e) => resolution.errors.push(e.to_string()),
            }
        }

        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::Package;
    use std::fs;
    use tempfile::TempDir;

    fn package_set(temp: &TempDir) -> PackageSet {
        let root_dir = temp.path().join("root");
        let theme_dir = temp.path().join("theme");
        fs::create_dir_all(root_dir.join("res")).unwrap();
        fs::create_dir_all(theme_dir.join("css")).unwrap();

        let mut packages = PackageSet::new(Package::root("root", &root_dir));
        packages.add(Package::new("acme/theme", &theme_dir)).unwrap();
        packages
    }

    #[test]
    fn test_parse_local_reference() {
        assert_eq!(
            PathReference::parse("res/css").unwrap(),
            PathReference::Local("res/css".to_string())
        );
    }

    #[test]
    fn test_parse_package_references() {
        assert_eq!(
            PathReference::parse("@acme/theme:css").unwrap(),
            PathReference::Package {
                package: "acme/theme".to_string(),
                path: "css".to_string(),
                optional: false,
            }
        );

        let optional = PathReference::parse("@?acme/theme:css").unwrap();
        assert!(optional.is_optional());
        assert_eq!(optional.to_string(), "@?acme/theme:css");
    }

    #[test]
    fn test_parse_rejects_malformed_references() {
        for reference in ["", "@acme", "@:css", "@?:css", "@??acme:css"] {
            assert!(
                matches!(
                    PathReference::parse(reference),
                    Err(Error::ResourceDefinition { .. })
                ),
                "{:?} should be rejected",
                reference
            );
        }
    }

    #[test]
    fn test_parse_many_references_with_shared_pattern() {
        let parsed: Vec<_> = (0..100)
            .map(|i| PathReference::parse(&format!("@?vendor/package{}:res/{}", i, i)).unwrap())
            .collect();

        assert_eq!(parsed.len(), 100);
        assert_eq!(
            parsed[42],
            PathReference::Package {
                package: "vendor/package42".to_string(),
                path: "res/42".to_string(),
                optional: true,
            }
        );
        assert!(matches!(
            PathReference::parse("@vendor/package1"),
            Err(Error::ResourceDefinition { .. })
        ));
    }

    #[test]
    fn test_resolve_local_and_package_references() {
        let temp = TempDir::new().unwrap();
        let packages = package_set(&temp);
        let resolver = ReferenceResolver::new(&packages, BuildMode::Tolerant);

        let local = resolver
            .resolve(&PathReference::parse("res").unwrap(), "root")
            .unwrap();
        assert_eq!(local, Resolved::Found(temp.path().join("root/res")));

        let remote = resolver
            .resolve(&PathReference::parse("@acme/theme:css").unwrap(), "root")
            .unwrap();
        assert_eq!(remote, Resolved::Found(temp.path().join("theme/css")));
    }

    #[test]
    fn test_resolve_unknown_package() {
        let temp = TempDir::new().unwrap();
        let packages = package_set(&temp);
        let resolver = ReferenceResolver::new(&packages, BuildMode::Tolerant);

        let required = resolver.resolve(&PathReference::parse("@missing:res").unwrap(), "root");
        assert!(matches!(required, Err(Error::NoSuchPackage { name }) if name == "missing"));

        let optional = resolver
            .resolve(&PathReference::parse("@?missing:res").unwrap(), "root")
            .unwrap();
        assert!(matches!(optional, Resolved::NotFound(_)));
    }

    #[test]
    fn test_resolve_strict_mode() {
        let temp = TempDir::new().unwrap();
        let packages = package_set(&temp);
        let resolver = ReferenceResolver::new(&packages, BuildMode::Strict);

        let optional = resolver.resolve(&PathReference::parse("@?missing:res").unwrap(), "root");
        assert!(matches!(optional, Err(Error::ResourceDefinition { .. })));

        let missing = resolver.resolve(&PathReference::parse("nowhere").unwrap(), "root");
        assert!(matches!(missing, Err(Error::Filesystem { .. })));
    }

    #[test]
    fn test_resolve_all_collects_errors_when_tolerant() {
        let temp = TempDir::new().unwrap();
        let packages = package_set(&temp);
        let resolver = ReferenceResolver::new(&packages, BuildMode::Tolerant);
        let references = vec![
            PathReference::parse("res").unwrap(),
            PathReference::parse("@missing:res").unwrap(),
            PathReference::parse("nowhere").unwrap(),
        ];

        let resolution = resolver.resolve_all(&references, "root", false).unwrap();
        assert_eq!(resolution.sources, vec![temp.path().join("root/res")]);
        assert_eq!(resolution.errors.len(), 2);

        let failed = resolver.resolve_all(&references, "root", true);
        assert!(matches!(failed, Err(Error::NoSuchPackage { .. })));
    }
}
