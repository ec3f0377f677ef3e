//! Helpers over slash-delimited node paths.
//!
//! Parent linkage in the tree is implicit in the path string; these two
//! functions recover it.

/// Returns everything before the last `/`; the root when the last `/` is the
/// leading one. A path without any `/` is returned unchanged, so malformed
/// paths resolve to a parent that cannot exist.
pub(crate) fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(pos) => &path[..pos],
        None => path,
    }
}

/// Returns everything after the last `/`.
pub(crate) fn base_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}
