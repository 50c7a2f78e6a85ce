//! Path resolution
//!
//! Paths are `/`-separated. A leading `/` starts from the root, anything else
//! starts from the given directory. `.` stays put, `..` climbs one level (and
//! stays put at the root), and every other segment must name an existing
//! child. Resolution never creates nodes.

use crate::core::tree::{NodeId, Tree};

/// Resolve `path` starting from `start`
///
/// Returns `None` when a segment does not exist. A file has no children, so
/// a file in the middle of a path also yields `None`.
pub fn resolve(tree: &Tree, start: NodeId, path: &str) -> Option<NodeId> {
    if path.is_empty() || path == "." {
        return tree.contains(start).then_some(start);
    }
    if path == "/" {
        return Some(tree.root());
    }
    if path == ".." {
        let node = tree.get(start).ok()?;
        return Some(node.parent().unwrap_or(start));
    }

    let mut current = if path.starts_with('/') {
        tree.root()
    } else {
        start
    };
    tree.get(current).ok()?;

    for segment in segments(path) {
        match segment {
            "." => {}
            ".." => {
                if let Some(parent) = tree.get(current).ok()?.parent() {
                    current = parent;
                }
            }
            name => current = tree.child(current, name)?,
        }
    }
    Some(current)
}

/// Non-empty segments of a path
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Split a destination path into its directory part and final name
///
/// A bare name lives in the current directory and a single leading-slash
/// segment lives in the root. The name may come back empty (`"dir/"`); callers
/// validate it.
///
/// ```
/// use sectorfs::core::path::split_parent;
///
/// assert_eq!(split_parent("notes.txt"), (".", "notes.txt"));
/// assert_eq!(split_parent("/notes.txt"), ("/", "notes.txt"));
/// assert_eq!(split_parent("docs/old/notes.txt"), ("docs/old", "notes.txt"));
/// assert_eq!(split_parent("docs/"), ("docs", ""));
/// ```
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        None => (".", path),
        Some(0) => ("/", &path[1..]),
        Some(idx) => (&path[..idx], &path[idx + 1..]),
    }
}
