//! Path normalization utilities
//!
//! Every path the engine compares or emits is relative to the collation root
//! and uses '/' as separator.

use std::path::Path;

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Make a path relative to the root directory
pub fn make_relative(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(normalize_path)
}

/// Split a normalized relative path into its non-empty segments
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

/// Number of segments in a relative path (`a/b.py` is 2)
pub fn depth(path: &str) -> usize {
    segments(path).count()
}

/// Last segment of a relative path
pub fn file_name(path: &str) -> &str {
    segments(path).last().unwrap_or("")
}

/// Extension including the leading dot (`.py`), or None.
///
/// Follows `Path::extension`: dotfiles such as `.bashrc` have no extension.
pub fn extension(path: &str) -> Option<String> {
    Path::new(file_name(path))
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

/// Check if a path segment is hidden (starts with '.')
pub fn is_hidden(segment: &str) -> bool {
    segment.starts_with('.') && segment != "." && segment != ".."
}

/// Every leading prefix of a path, shortest first (`a`, `a/b`, `a/b/c`)
pub fn prefixes(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for seg in segments(path) {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(seg);
        out.push(current.clone());
    }
    out
}

/// Check whether `path` lies under (or equals) `dir`, at segment boundaries
pub fn is_under(path: &str, dir: &str) -> bool {
    let mut path_segs = segments(path);
    segments(dir).all(|d| path_segs.next() == Some(d))
}
