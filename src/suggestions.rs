//! # Error Suggestions
//!
//! Helpers that turn common failures into messages telling the user what
//! went wrong and how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resource_overlay::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Package file not found: {}", dir.display());
//!
//! // Use:
//! return Err(suggestions::package_file_not_found(dir));
//! ```

use std::path::Path;

use crate::defaults::{PACKAGE_FILENAMES, ROOT_DIR_ENV};

/// Generate an error for a root directory without a package file.
///
/// Includes hints about creating the file and pointing at another directory.
pub fn package_file_not_found(dir: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "No package file found in {dir}\n\
         Looked for: {names}\n\n\
         hint: Create a resources.json file with at least a \"name\" key\n\
         hint: Use --root-dir to point at another package directory\n\
         hint: Set the {env} environment variable",
        dir = dir.display(),
        names = PACKAGE_FILENAMES.join(", "),
        env = ROOT_DIR_ENV
    )
}

/// Generate an error for a package name that is not installed.
///
/// Suggests an installed package with a similar name.
pub fn unknown_package(name: &str, installed: &[&str]) -> anyhow::Error {
    let did_you_mean = find_similar(name, installed)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown package: {name}{did_you_mean}\n\n\
         Installed packages are: {packages}\n\
         hint: Run 'resource-overlay packages' to list installed packages",
        packages = installed.join(", ")
    )
}

/// Generate an error for an invalid glob pattern.
///
/// Includes hints about glob syntax.
pub fn invalid_glob(pattern: &str, error: &glob::PatternError) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid glob pattern: {pattern}\n\
         error: {error}\n\n\
         hint: Use * for single path component, ** for recursive matching\n\
         hint: Use [abc] for character classes, [!abc] to negate"
    )
}

/// Generate an error for a malformed path reference.
///
/// Includes the accepted reference forms.
pub fn invalid_reference(reference: &str, error: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid path reference: {reference}\n\
         error: {error}\n\n\
         hint: Use a path relative to the root package, e.g. 'res/css'\n\
         hint: Use '@vendor/package:path' to reference another package\n\
         hint: Use '@?vendor/package:path' if the package may be missing"
    )
}

/// Generate an error for a strict build that met conflicting mappings.
///
/// Includes hints about declaring an override order.
pub fn unresolved_conflict(path: &str, packages: &[String]) -> anyhow::Error {
    anyhow::anyhow!(
        "Conflicting mappings for {path} in packages {packages}\n\n\
         hint: Run 'resource-overlay conflicts --resolve' to pick a winner\n\
         hint: Add the packages to \"override-order\" in the root package file\n\
         hint: Build without --strict to record the conflict instead",
        packages = packages.join(", ")
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}
