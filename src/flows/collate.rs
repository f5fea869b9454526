//! Collation flow - Gather project files into a single LLM-ready document
//!
//! The document is the tree preview followed by one fenced block per
//! included file, in priority order. Every block and the whole document get
//! a token estimate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

use crate::core::config::Config;
use crate::core::error::{CodesightError, FileError, Result};
use crate::core::file_reader::read_text;
use crate::core::paths::{extension, make_relative};
use crate::core::tokenizer::TokenEstimator;
use crate::filter::{GitignoreSpec, IgnoreEngine};
use crate::structure::{generate_tree, sort_paths};
use crate::transform::truncate;

/// Statistics for a single collated file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    /// Estimated tokens of the formatted block (None when estimation is unavailable)
    pub tokens: Option<usize>,
    pub lines: usize,
    /// Size of the embedded content in bytes
    pub bytes: usize,
    /// Whether literal truncation ran on this file
    pub truncated: bool,
    /// Encoding the file was decoded from
    pub encoding: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// One included file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path relative to the root, '/'-separated
    pub path: String,
    /// Text as embedded (decoded, possibly truncated)
    pub content: String,
    pub stats: FileStats,
}

/// Output of one collation run
#[derive(Debug, Clone, Default)]
pub struct CollationResult {
    pub document: String,
    /// Estimated tokens of the whole document
    pub total_tokens: Option<usize>,
    /// Included files in emission order
    pub files: Vec<FileRecord>,
    pub stats: BTreeMap<String, FileStats>,
    /// Files that were skipped because they could not be processed
    pub errors: Vec<FileError>,
}

impl CollationResult {
    pub fn total_lines(&self) -> usize {
        self.stats.values().map(|s| s.lines).sum()
    }
}

/// Collate every included file under `root`.
///
/// Fails only on an invalid configuration or an unusable root. Files that
/// cannot be read are recorded in [`CollationResult::errors`].
pub fn collate(
    root: &Path,
    config: &Config,
    estimator: &dyn TokenEstimator,
) -> Result<CollationResult> {
    config.validate()?;

    if !root.exists() {
        return Err(CodesightError::precondition(format!(
            "root path does not exist: {}",
            root.display()
        )));
    }
    if !root.is_dir() {
        return Err(CodesightError::precondition(format!(
            "root path is not a directory: {}",
            root.display()
        )));
    }

    let spec = GitignoreSpec::load(root);
    let engine = IgnoreEngine::new(config, &spec);

    let mut result = CollationResult::default();
    let mut paths = discover(root, &engine, &mut result.errors);
    sort_paths(&mut paths);
    log::debug!("Collating {} files from {}", paths.len(), root.display());

    let mut blocks = Vec::with_capacity(paths.len());
    for path in paths {
        match process_file(root, &path, config, estimator) {
            Ok((block, record)) => {
                blocks.push(block);
                result.stats.insert(record.path.clone(), record.stats.clone());
                result.files.push(record);
            }
            Err(e) => {
                log::warn!("Skipping {}: {}", e.path, e.message);
                result.errors.push(e);
            }
        }
    }

    if !result.errors.is_empty() {
        log::warn!(
            "Encountered errors in {} files while collating",
            result.errors.len()
        );
    }

    let tree = generate_tree(root, &engine);
    result.document = format!("{}\n{}", tree, blocks.join("\n"));
    result.total_tokens = estimator.estimate(&result.document);
    Ok(result)
}

/// Relative paths of all regular files that pass the ignore rules
fn discover(root: &Path, engine: &IgnoreEngine, errors: &mut Vec<FileError>) -> Vec<String> {
    let walker = WalkDir::new(root).into_iter().filter_entry(|e| {
        if e.depth() == 0 || !e.file_type().is_dir() {
            return true;
        }
        make_relative(e.path(), root)
            .map(|rel| engine.may_descend(&rel))
            .unwrap_or(false)
    });

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e
                    .path()
                    .and_then(|p| make_relative(p, root))
                    .unwrap_or_default();
                log::warn!("Failed to walk {}: {}", path, e);
                errors.push(FileError::new(path, e.to_string()));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel) = make_relative(entry.path(), root) else {
            continue;
        };
        if !engine.should_ignore(&rel) {
            paths.push(rel);
        }
    }
    paths
}

fn process_file(
    root: &Path,
    path: &str,
    config: &Config,
    estimator: &dyn TokenEstimator,
) -> std::result::Result<(String, FileRecord), FileError> {
    let decoded = read_text(&root.join(path), &config.read_config())
        .map_err(|e| FileError::new(path, e.to_string()))?;
    let mut content = decoded.content;

    let ext = extension(path);
    let mut truncated = false;
    if ext.as_deref() == Some(".py") && config.truncates_python() {
        let (text, ok) = truncate(&content, config.truncate_py_literals);
        if ok {
            content = text;
            truncated = true;
        } else {
            log::warn!("Failed to process Python literals in {}", path);
        }
    }

    let documentation = config.doc_for(path).map(String::from);
    let block = format_block(path, ext.as_deref(), &content, documentation.as_deref());
    log::debug!("Collated {} ({} bytes)", path, content.len());

    let stats = FileStats {
        tokens: estimator.estimate(&block),
        lines: content.lines().count(),
        bytes: content.len(),
        truncated,
        encoding: decoded.encoding.to_string(),
        documentation,
    };

    Ok((
        block,
        FileRecord {
            path: path.to_string(),
            content,
            stats,
        },
    ))
}

/// Format one file as a header plus fenced block
pub fn format_block(path: &str, ext: Option<&str>, content: &str, doc: Option<&str>) -> String {
    let label = ext.map(|e| e.trim_start_matches('.')).unwrap_or("");
    let fence = fence_for(content);

    let mut block = format!("### {}\n", path);
    if let Some(doc) = doc {
        block.push_str(&format!("DOCUMENTATION: {}\n", doc));
    }
    block.push('\n');
    block.push_str(&fence);
    block.push_str(label);
    block.push('\n');
    block.push_str(content);
    if !content.is_empty() && !content.ends_with('\n') {
        block.push('\n');
    }
    block.push_str(&fence);
    block.push('\n');
    block
}

/// A backtick fence longer than any backtick run in `content`
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}
