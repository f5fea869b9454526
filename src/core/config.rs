//! Configuration model and layered loading
//!
//! A run's configuration is built in stages and never mutated afterwards:
//! built-in defaults, then an optional project-type template overlay, then
//! user overrides (usually a TOML file), then validation. Tables merge
//! recursively; any other value replaces what was there.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::core::error::{CodesightError, Result};
use crate::core::file_reader::{FileReadConfig, DEFAULT_MAX_FILE_SIZE};
use crate::filter::gitignore::GitignoreSpec;

/// Keys a configuration document must carry when loaded without defaults
pub const REQUIRED_KEYS: [&str; 4] = [
    "include_extensions",
    "exclude_files",
    "include_files",
    "truncate_py_literals",
];

/// Resolved, validated configuration for one collation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// File suffixes eligible for inclusion, each starting with '.'
    pub include_extensions: BTreeSet<String>,

    /// Suffixes removed from the allow-list (typically set by templates)
    #[serde(default)]
    pub exclude_extensions: BTreeSet<String>,

    /// Paths always included, regardless of every other rule
    pub include_files: BTreeSet<String>,

    /// Gitignore-style patterns that force exclusion
    pub exclude_files: Vec<String>,

    /// Maximum elements kept per Python list/set/dict literal
    pub truncate_py_literals: usize,

    /// Restrict the scan to these subtrees (empty means everything)
    #[serde(default)]
    pub key_directories: Vec<String>,

    /// Relative path -> one-line annotation emitted above the file
    #[serde(default)]
    pub file_docs: BTreeMap<String, String>,

    /// Named override bundles, merged by project type
    #[serde(default)]
    pub templates: BTreeMap<String, toml::Table>,

    /// Files larger than this are skipped (bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn set_of(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn template(exclude_extensions: &[&str], key_directories: &[&str], docs: &[(&str, &str)]) -> toml::Table {
    let mut table = toml::Table::new();
    table.insert(
        "exclude_extensions".into(),
        toml::Value::Array(exclude_extensions.iter().map(|s| toml::Value::from(*s)).collect()),
    );
    table.insert(
        "key_directories".into(),
        toml::Value::Array(key_directories.iter().map(|s| toml::Value::from(*s)).collect()),
    );
    let file_docs: toml::Table = docs
        .iter()
        .map(|(k, v)| (k.to_string(), toml::Value::from(*v)))
        .collect();
    table.insert("file_docs".into(), toml::Value::Table(file_docs));
    table
}

impl Default for Config {
    fn default() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(
            "python".to_string(),
            template(
                &[".csv", ".pkl", ".db"],
                &["src", "tests"],
                &[
                    ("pyproject.toml", "Project configuration and dependencies"),
                    ("README.md", "Project documentation and usage guide"),
                ],
            ),
        );
        templates.insert(
            "javascript".to_string(),
            template(
                &[".map", ".lock"],
                &["src", "test"],
                &[
                    ("package.json", "Project configuration and dependencies"),
                    ("README.md", "Project documentation and usage guide"),
                ],
            ),
        );

        Self {
            include_extensions: set_of(&[".py", ".md", ".rst", ".sql", ".toml"]),
            exclude_extensions: BTreeSet::new(),
            include_files: set_of(&["pyproject.toml", "README.md", ".github", ".flake8"]),
            exclude_files: vec![".gitignore".to_string()],
            truncate_py_literals: 5,
            key_directories: Vec::new(),
            file_docs: BTreeMap::new(),
            templates,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl Config {
    /// Parse a standalone TOML document (no defaults applied)
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let table: toml::Table = s
            .parse()
            .map_err(|e| CodesightError::config(format!("failed to parse TOML configuration: {e}")))?;
        Self::from_table(table)
    }

    /// Build from a fully-merged table, enforcing required keys and types
    pub fn from_table(table: toml::Table) -> Result<Self> {
        check_required(&table)?;
        let config: Config = toml::Value::Table(table)
            .try_into()
            .map_err(|e| CodesightError::config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value-level invariants
    pub fn validate(&self) -> Result<()> {
        for (key, set) in [
            ("include_extensions", &self.include_extensions),
            ("exclude_extensions", &self.exclude_extensions),
        ] {
            if let Some(bad) = set.iter().find(|ext| !ext.starts_with('.') || ext.len() < 2) {
                return Err(CodesightError::config(format!(
                    "{key}: extension {bad:?} must be a suffix starting with '.'"
                )));
            }
        }

        if let Err(e) = GitignoreSpec::from_lines(&self.exclude_files) {
            return Err(CodesightError::config(format!(
                "exclude_files: invalid pattern: {e}"
            )));
        }

        if let Some(bad) = self.key_directories.iter().find(|d| d.trim().is_empty()) {
            return Err(CodesightError::config(format!(
                "key_directories: invalid entry {bad:?}"
            )));
        }

        Ok(())
    }

    /// Whether a suffix (with leading '.') passes the extension allow-list
    pub fn allows_extension(&self, ext: &str) -> bool {
        self.include_extensions.contains(ext) && !self.exclude_extensions.contains(ext)
    }

    /// Annotation configured for a relative path
    pub fn doc_for(&self, path: &str) -> Option<&str> {
        self.file_docs.get(path).map(String::as_str)
    }

    /// Whether Python literal truncation is enabled
    pub fn truncates_python(&self) -> bool {
        self.truncate_py_literals > 0
    }

    pub fn read_config(&self) -> FileReadConfig {
        FileReadConfig {
            max_file_size: self.max_file_size,
        }
    }

    /// The built-in defaults as a TOML table
    pub fn default_table() -> Result<toml::Table> {
        match toml::Value::try_from(Config::default()) {
            Ok(toml::Value::Table(table)) => Ok(table),
            Ok(_) => Err(CodesightError::config("defaults did not serialize to a table")),
            Err(e) => Err(CodesightError::config(format!(
                "failed to serialize defaults: {e}"
            ))),
        }
    }
}

fn check_required(table: &toml::Table) -> Result<()> {
    if let Some(missing) = REQUIRED_KEYS.iter().find(|k| !table.contains_key(**k)) {
        return Err(CodesightError::config(format!(
            "missing required key: {missing}"
        )));
    }

    for key in ["include_extensions", "include_files", "exclude_files"] {
        let ok = match table.get(key) {
            Some(toml::Value::Array(items)) => items.iter().all(toml::Value::is_str),
            _ => false,
        };
        if !ok {
            return Err(CodesightError::config(format!(
                "{key} must be a list of strings"
            )));
        }
    }

    match table.get("truncate_py_literals") {
        Some(toml::Value::Integer(n)) if *n >= 0 => Ok(()),
        _ => Err(CodesightError::config(
            "truncate_py_literals must be a non-negative integer",
        )),
    }
}

/// Recursively merge `overlay` into `base`
pub fn merge_tables(base: &mut toml::Table, overlay: &toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Load a user configuration file (TOML only)
pub fn load_user_config(path: &Path) -> Result<toml::Table> {
    if !path.exists() {
        return Err(CodesightError::config(format!(
            "configuration file not found: {}",
            path.display()
        )));
    }

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {}
        other => {
            return Err(CodesightError::config(format!(
                "unsupported config file format: {}",
                other.map(|e| format!(".{e}")).unwrap_or_else(|| "(none)".into())
            )))
        }
    }

    let content = fs::read_to_string(path)?;
    let table = content
        .parse::<toml::Table>()
        .map_err(|e| CodesightError::config(format!("failed to parse TOML configuration: {e}")))?;
    log::debug!("Loaded configuration from {}", path.display());
    Ok(table)
}

/// Staged configuration build: defaults -> template -> overrides -> validate
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    project_type: Option<String>,
    overrides: Vec<toml::Table>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the template overlay to apply
    pub fn project_type(mut self, name: impl Into<String>) -> Self {
        self.project_type = Some(name.into());
        self
    }

    /// Add a user override layer (applied in insertion order)
    pub fn overrides(mut self, table: toml::Table) -> Self {
        self.overrides.push(table);
        self
    }

    /// Add a user override layer read from a TOML file
    pub fn user_config_file(self, path: &Path) -> Result<Self> {
        let table = load_user_config(path)?;
        Ok(self.overrides(table))
    }

    pub fn build(self) -> Result<Config> {
        let mut merged = Config::default_table()?;

        if let Some(name) = &self.project_type {
            // User layers may define or extend templates too.
            let mut templates = match merged.get("templates") {
                Some(toml::Value::Table(t)) => t.clone(),
                _ => toml::Table::new(),
            };
            for layer in &self.overrides {
                if let Some(toml::Value::Table(t)) = layer.get("templates") {
                    merge_tables(&mut templates, t);
                }
            }

            match templates.get(name) {
                Some(toml::Value::Table(overlay)) => {
                    log::debug!("Applying template {}", name);
                    merge_tables(&mut merged, overlay);
                }
                Some(_) => {
                    return Err(CodesightError::config(format!(
                        "template {name} must be a table"
                    )))
                }
                None => log::debug!("No template named {}; using defaults", name),
            }
        }

        for layer in &self.overrides {
            merge_tables(&mut merged, layer);
        }

        Config::from_table(merged)
    }
}

/// Project flavor inferred from marker files at the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Python,
    Javascript,
    Unopinionated,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Python => "python",
            ProjectType::Javascript => "javascript",
            ProjectType::Unopinionated => "unopinionated",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "python" | "py" => Ok(ProjectType::Python),
            "javascript" | "js" => Ok(ProjectType::Javascript),
            "unopinionated" | "none" => Ok(ProjectType::Unopinionated),
            _ => Err(format!("Unknown project type: {}", s)),
        }
    }
}

const PYTHON_MARKERS: [&str; 3] = ["pyproject.toml", "setup.py", "requirements.txt"];
const JAVASCRIPT_MARKERS: [&str; 2] = ["package.json", "package-lock.json"];

/// Detect the project type from marker files directly under `root`
pub fn detect_project_type(root: &Path) -> ProjectType {
    if PYTHON_MARKERS.iter().any(|m| root.join(m).exists()) {
        ProjectType::Python
    } else if JAVASCRIPT_MARKERS.iter().any(|m| root.join(m).exists()) {
        ProjectType::Javascript
    } else {
        ProjectType::Unopinionated
    }
}
