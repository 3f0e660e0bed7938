//! Property-based tests for repository path functions.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{common_ancestor, depth, is_ancestor_or_self, normalize, overlaps};
    use proptest::prelude::*;

    /// Strategy producing normalized repository paths with up to 4 segments
    fn repository_path() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-c]{1,2}", 0..4).prop_map(|segments| {
            if segments.is_empty() {
                "/".to_string()
            } else {
                format!("/{}", segments.join("/"))
            }
        })
    }

    // ============================================================================
    // normalize property tests
    // ============================================================================

    proptest! {
        /// Property: normalize is idempotent
        #[test]
        fn normalize_is_idempotent(input in "/[a-z/]{0,20}") {
            let once = normalize(&input).unwrap();
            let twice = normalize(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// Property: normalized paths never end with a slash (except the root)
        #[test]
        fn normalize_strips_trailing_slash(input in "/[a-z/]{0,20}") {
            let result = normalize(&input).unwrap();
            prop_assert!(result == "/" || !result.ends_with('/'));
            prop_assert!(!result.contains("//"));
        }
    }

    // ============================================================================
    // containment property tests
    // ============================================================================

    proptest! {
        /// Property: overlap is symmetric
        #[test]
        fn overlaps_is_symmetric(a in repository_path(), b in repository_path()) {
            prop_assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
        }

        /// Property: an ancestor is never deeper than its descendant
        #[test]
        fn ancestor_is_not_deeper(a in repository_path(), b in repository_path()) {
            if is_ancestor_or_self(&a, &b) {
                prop_assert!(depth(&a) <= depth(&b));
            }
        }

        /// Property: the common ancestor contains every input path
        #[test]
        fn common_ancestor_contains_all(paths in prop::collection::vec(repository_path(), 1..5)) {
            let ancestor = common_ancestor(paths.iter().map(String::as_str));
            for path in &paths {
                prop_assert!(
                    is_ancestor_or_self(&ancestor, path),
                    "{} should contain {}",
                    ancestor,
                    path
                );
            }
        }

        /// Property: for overlapping paths the common ancestor is the shorter path
        #[test]
        fn common_ancestor_of_overlapping_paths_is_shorter(a in repository_path(), b in repository_path()) {
            if overlaps(&a, &b) {
                let shorter = if depth(&a) <= depth(&b) { &a } else { &b };
                prop_assert_eq!(&common_ancestor([a.as_str(), b.as_str()]), shorter);
            }
        }
    }
}
