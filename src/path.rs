//! Repository path utilities
//!
//! Repository paths are virtual, slash-separated and absolute (`/acme/blog`).
//! They never carry a trailing slash, except for the root `/` itself.

use crate::error::{Error, Result};

/// The root of every repository.
pub const ROOT: &str = "/";

/// Normalize a repository path
///
/// Collapses repeated slashes and strips a trailing slash. Rejects paths that
/// are empty, relative, or contain `.`/`..` segments.
pub fn normalize(path: &str) -> Result<String> {
    if !path.starts_with('/') {
        return Err(Error::Path {
            message: format!("Repository path must be absolute: \"{}\"", path),
        });
    }

    let mut normalized = String::with_capacity(path.len());
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(Error::Path {
                message: format!("Repository path must not contain \"{}\": \"{}\"", segment, path),
            });
        }
        normalized.push('/');
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        normalized.push('/');
    }

    Ok(normalized)
}

/// Returns true if `ancestor` equals `path` or is one of its ancestors
pub fn is_ancestor_or_self(ancestor: &str, path: &str) -> bool {
    if ancestor == ROOT {
        return true;
    }
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Returns true if one path equals or contains the other
pub fn overlaps(a: &str, b: &str) -> bool {
    is_ancestor_or_self(a, b) || is_ancestor_or_self(b, a)
}

/// Number of segments below the root (`/` has depth 0)
pub fn depth(path: &str) -> usize {
    path.split('/').filter(|s| !s.is_empty()).count()
}

/// Remainder of `path` below `ancestor`, without a leading slash
///
/// Returns `Some("")` when the paths are equal and `None` when `ancestor`
/// does not contain `path`.
pub fn relative_to<'a>(ancestor: &str, path: &'a str) -> Option<&'a str> {
    if !is_ancestor_or_self(ancestor, path) {
        return None;
    }
    if ancestor == ROOT {
        return Some(path.trim_start_matches('/'));
    }
    Some(path[ancestor.len()..].trim_start_matches('/'))
}

/// Append a relative segment list to a repository path
pub fn join(base: &str, relative: &str) -> String {
    let relative = relative.trim_matches('/');
    if relative.is_empty() {
        base.to_string()
    } else if base == ROOT {
        format!("/{}", relative)
    } else {
        format!("{}/{}", base, relative)
    }
}

/// Deepest path that equals or contains every given path
///
/// Returns `/` for an empty input.
pub fn common_ancestor<'a, I>(paths: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut common: Option<Vec<&str>> = None;

    for path in paths {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        common = Some(match common {
            None => segments,
            Some(current) => current
                .iter()
                .zip(segments.iter())
                .take_while(|(a, b)| a == b)
                .map(|(a, _)| *a)
                .collect(),
        });
    }

    match common {
        Some(segments) if !segments.is_empty() => format!("/{}", segments.join("/")),
        _ => ROOT.to_string(),
    }
}
