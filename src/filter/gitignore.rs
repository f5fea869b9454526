//! Gitignore spec compilation
//!
//! Patterns follow Git wildcard semantics (`**`, `!` negation, trailing-slash
//! directory anchors, leading-slash root anchors) via the `ignore` crate.
//! Paths handed to the matcher are relative to the collation root.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs;
use std::path::Path;

use crate::core::file_reader::decode_bytes;

/// Directories excluded from every run regardless of `.gitignore`
///
/// Version-control metadata, tool caches and dependency trees.
pub const INFRA_PATTERNS: [&str; 12] = [
    ".git/",
    ".hg/",
    ".svn/",
    "__pycache__/",
    ".mypy_cache/",
    ".pytest_cache/",
    ".ruff_cache/",
    ".tox/",
    ".venv/",
    "venv/",
    "node_modules/",
    "*.egg-info/",
];

/// A compiled, immutable set of gitignore patterns
#[derive(Debug, Clone)]
pub struct GitignoreSpec {
    matcher: Gitignore,
}

impl GitignoreSpec {
    /// A spec that matches nothing
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }

    /// Compile patterns from lines; blank lines and `#` comments are skipped
    pub fn from_lines<I, S>(lines: I) -> Result<Self, ignore::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new(".");
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            builder.add_line(None, line)?;
        }
        Ok(Self {
            matcher: builder.build()?,
        })
    }

    /// Compile the spec for a root: infra directories plus the root `.gitignore`.
    ///
    /// A missing or unreadable `.gitignore` contributes no patterns; invalid
    /// lines are skipped. This never fails.
    pub fn load(root: &Path) -> Self {
        let mut lines: Vec<String> = INFRA_PATTERNS.iter().map(|p| p.to_string()).collect();
        lines.extend(read_gitignore_lines(root));

        let mut builder = GitignoreBuilder::new(".");
        for line in &lines {
            if let Err(e) = builder.add_line(None, line) {
                log::warn!("Skipping invalid .gitignore pattern {:?}: {}", line, e);
            }
        }

        match builder.build() {
            Ok(matcher) => Self { matcher },
            Err(e) => {
                log::warn!("Failed to compile .gitignore patterns: {}", e);
                Self::empty()
            }
        }
    }

    /// Check whether a relative path (or any of its parents) is ignored
    pub fn is_match(&self, path: &str, is_dir: bool) -> bool {
        if path.is_empty() || self.matcher.is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(Path::new(path), is_dir)
            .is_ignore()
    }

    /// Number of compiled patterns
    pub fn len(&self) -> u64 {
        self.matcher.num_ignores() + self.matcher.num_whitelists()
    }

    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }
}

/// Read pattern lines from `<root>/.gitignore`, decoding non-UTF-8 content
fn read_gitignore_lines(root: &Path) -> Vec<String> {
    let path = root.join(".gitignore");
    if !path.is_file() {
        log::debug!("No .gitignore file found at {}", path.display());
        return Vec::new();
    }

    let bytes = match fs::read(&path) {
        Ok(b) => b,
        Err(e) => {
            log::warn!("Failed to read .gitignore: {}", e);
            return Vec::new();
        }
    };

    let decoded = decode_bytes(&bytes);
    if decoded.detected {
        log::warn!(
            "Failed to read .gitignore as UTF-8, decoded as {}",
            decoded.encoding
        );
    }

    decoded
        .content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_star_pattern_matches_suffix_only() {
        let spec = GitignoreSpec::from_lines(["*.log"]).unwrap();
        assert!(spec.is_match("debug.log", false));
        assert!(spec.is_match("logs/debug.log", false));
        assert!(!spec.is_match("debug.log.txt", false));
    }

    #[test]
    fn test_root_anchored_directory() {
        let spec = GitignoreSpec::from_lines(["/build/"]).unwrap();
        assert!(spec.is_match("build/output.txt", false));
        assert!(!spec.is_match("src/build/file.txt", false));
        // A file named like the directory is not matched by a dir-only pattern
        assert!(!spec.is_match("build", false));
    }

    #[test]
    fn test_negation_reincludes() {
        let spec = GitignoreSpec::from_lines(["*.log", "!important.log"]).unwrap();
        assert!(spec.is_match("debug.log", false));
        assert!(!spec.is_match("important.log", false));
    }

    #[test]
    fn test_double_star() {
        let spec = GitignoreSpec::from_lines(["docs/**/*.tmp"]).unwrap();
        assert!(spec.is_match("docs/a/b/c.tmp", false));
        assert!(!spec.is_match("src/c.tmp", false));
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let spec = GitignoreSpec::from_lines(["# comment", "", "  ", "*.pyc"]).unwrap();
        assert_eq!(spec.len(), 1);
        assert!(spec.is_match("a.pyc", false));
    }

    #[test]
    fn test_empty_matches_nothing() {
        let spec = GitignoreSpec::empty();
        assert!(spec.is_empty());
        assert!(!spec.is_match("anything.py", false));
    }

    #[test]
    fn test_invalid_range_rejected() {
        assert!(GitignoreSpec::from_lines(["[z-a].txt"]).is_err());
    }

    #[test]
    fn test_load_skips_invalid_lines() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "[z-a].txt\n*.log\n").unwrap();

        let spec = GitignoreSpec::load(dir.path());
        assert!(spec.is_match("debug.log", false));
    }

    #[test]
    fn test_load_without_gitignore_matches_only_infra() {
        let dir = tempdir().unwrap();
        let spec = GitignoreSpec::load(dir.path());
        assert_eq!(spec.len(), INFRA_PATTERNS.len() as u64);
        assert!(!spec.is_match("debug.log", false));
        assert!(!spec.is_match("src/app.py", false));
        assert!(!spec.is_match("build/output.txt", false));
        assert!(spec.is_match("node_modules/pkg/index.js", false));
        assert!(spec.is_match("src/__pycache__/app.cpython-312.pyc", false));
    }

    #[test]
    fn test_load_reads_root_gitignore() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "*.pyc\n/build/\n# note\n").unwrap();

        let spec = GitignoreSpec::load(dir.path());
        assert!(spec.is_match("test.pyc", false));
        assert!(!spec.is_match("test.py", false));
        assert!(spec.is_match("build/out.py", false));
    }

    #[test]
    fn test_load_non_utf8_gitignore() {
        let dir = tempdir().unwrap();
        let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode("# café résumé\n*.log\nnaïve.txt\n");
        fs::write(dir.path().join(".gitignore"), &bytes).unwrap();

        let spec = GitignoreSpec::load(dir.path());
        assert!(spec.is_match("debug.log", false));
    }
}
