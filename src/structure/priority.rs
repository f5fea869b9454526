//! File ordering
//!
//! Files are grouped by role and emitted group by group, shallow paths
//! first, then alphabetically.

use crate::core::paths::{depth, file_name, segments};

/// Manifest, readme and license files
pub const CORE_FILES: [&str; 7] = [
    "README.md",
    "README.rst",
    "pyproject.toml",
    "setup.py",
    "package.json",
    "LICENSE",
    "CHANGELOG.md",
];

/// Recognized source roots
pub const CORE_DIRS: [&str; 3] = ["src", "lib", "core"];

pub const DOC_DIRS: [&str; 5] = ["docs", "doc", "documentation", "examples", "meta"];

pub const BUILD_DIRS: [&str; 4] = ["dist", "build", "target", "out"];

/// Package markers count as entry points at any depth
const PACKAGE_INIT: &str = "__init__.py";

/// Entry points only outside the core source roots
const MAIN_MODULES: [&str; 2] = ["main.py", "__main__.py"];

/// Role of a file, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityGroup {
    CoreFile = 1,
    Config = 2,
    EntryPoint = 3,
    CoreSource = 4,
    Test = 5,
    Documentation = 6,
    BuildArtifact = 7,
    Other = 8,
}

impl PriorityGroup {
    pub fn rank(self) -> u8 {
        self as u8
    }
}

/// Classify a relative path. Checks run in rank order; first match wins.
pub fn classify(path: &str) -> PriorityGroup {
    let name = file_name(path);
    let dirs = parent_segments(path);

    if CORE_FILES.contains(&name) {
        PriorityGroup::CoreFile
    } else if is_config_file(name) {
        PriorityGroup::Config
    } else if is_entry_point(name, &dirs) {
        PriorityGroup::EntryPoint
    } else if in_any(&dirs, &CORE_DIRS) && !segments(path).any(|s| s.starts_with("test")) {
        PriorityGroup::CoreSource
    } else if is_test_file(name, &dirs) {
        PriorityGroup::Test
    } else if in_any(&dirs, &DOC_DIRS) {
        PriorityGroup::Documentation
    } else if in_any(&dirs, &BUILD_DIRS) {
        PriorityGroup::BuildArtifact
    } else {
        PriorityGroup::Other
    }
}

/// Priority group number, 1 (first) to 8 (last)
pub fn priority_group(path: &str) -> u8 {
    classify(path).rank()
}

/// Full ordering key: group, depth, then the path itself
pub fn sort_key(path: &str) -> (u8, usize, &str) {
    (priority_group(path), depth(path), path)
}

/// Sort relative paths into emission order
pub fn sort_paths(paths: &mut [String]) {
    paths.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
}

fn parent_segments(path: &str) -> Vec<&str> {
    let mut segs: Vec<&str> = segments(path).collect();
    segs.pop();
    segs
}

fn in_any(dirs: &[&str], set: &[&str]) -> bool {
    dirs.iter().any(|d| set.contains(d))
}

fn is_entry_point(name: &str, dirs: &[&str]) -> bool {
    name == PACKAGE_INIT || (MAIN_MODULES.contains(&name) && !in_any(dirs, &CORE_DIRS))
}

fn is_config_file(name: &str) -> bool {
    name.starts_with('.')
        || name.ends_with("config.py")
        || name.ends_with(".ini")
        || name.ends_with(".cfg")
}

fn is_test_file(name: &str, dirs: &[&str]) -> bool {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    stem.starts_with("test_")
        || stem.ends_with("_test")
        || matches!(stem, "test" | "tests" | "conftest")
        || in_any(dirs, &["test", "tests"])
}
