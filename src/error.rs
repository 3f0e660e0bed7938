//! # Error Handling
//!
//! This module defines the centralized error type for `resource-overlay`. It
//! uses `thiserror` to derive an `Error` enum that covers every failure the
//! library can surface, with a `Result<T>` alias used throughout the crate.
//!
//! The variants fall into three groups:
//!
//! - **Resolution errors** raised while turning path references into local
//!   resources: `NoSuchPackage`, `ResourceDefinition` and `Filesystem`.
//! - **Builder errors** raised by the repository builder: `ResourceConflict`
//!   (strict builds only), `RepositoryNotEmpty`, `NotLoaded`, `InvalidOperation`
//!   and `Persistence`.
//! - **Foundation errors** wrapped from the crates the library depends on
//!   (I/O, JSON, YAML and regex errors) plus package file validation.
//!
//! Expected outcomes such as a reference that points nowhere are *not*
//! errors: they are reported through `MappingState::NotFound`. Errors are
//! reserved for malformed input, strict-mode failures and persistence.

use thiserror::Error;

/// Main error type for resource-overlay operations
#[derive(Error, Debug)]
pub enum Error {
    /// A non-optional path reference names a package that is not installed.
    #[error("The package \"{name}\" does not exist")]
    NoSuchPackage { name: String },

    /// A path reference is malformed, or (in strict mode) an optional
    /// reference names an unknown package.
    #[error("Invalid path reference \"{reference}\": {message}")]
    ResourceDefinition { reference: String, message: String },

    /// A strict build met two or more mappings contending for a path with no
    /// override relation between their packages.
    #[error("Conflicting mappings for \"{path}\" in packages {}", packages.join(", "))]
    ResourceConflict { path: String, packages: Vec<String> },

    /// The destination repository already has content.
    #[error("The repository is not empty")]
    RepositoryNotEmpty,

    /// A conflict operation was attempted on a mapping that is not loaded.
    #[error("The mapping for \"{path}\" is not loaded")]
    NotLoaded { path: String },

    /// The operation is not allowed in the current state, e.g. unloading the
    /// root package or installing a package twice.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    /// A strict build met a path reference whose local path does not exist.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// Saving package metadata failed.
    #[error("Could not persist package metadata: {message}")]
    Persistence { message: String },

    /// A package file could not be parsed or failed validation.
    ///
    /// Includes an optional hint about how to fix the file.
    #[error("Invalid package file {path}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    PackageFile {
        path: String,
        message: String,
        /// Optional hint for how to fix the package file
        hint: Option<String>,
    },

    /// A repository path is invalid.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
