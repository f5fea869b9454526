//! Layered include/exclude decision
//!
//! Rules are evaluated in a fixed order and the first rule with an opinion
//! decides. Each rule overrides every rule after it.
//!
//! 1. explicit include (`include_files`)
//! 2. hidden path segment
//! 3. root `.gitignore` (plus infra directories)
//! 4. `exclude_files` patterns
//! 5. `key_directories` restriction
//! 6. extension allow-list
//!
//! A path no rule rejects is included.

use std::fmt;

use crate::core::config::Config;
use crate::core::paths::{extension, is_hidden, is_under, prefixes, segments};
use crate::filter::gitignore::GitignoreSpec;

/// One stage of the rule chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    ExplicitInclude,
    HiddenSegment,
    Gitignore,
    ExcludePattern,
    KeyDirectory,
    Extension,
}

impl Rule {
    /// Evaluation order
    pub const CHAIN: [Rule; 6] = [
        Rule::ExplicitInclude,
        Rule::HiddenSegment,
        Rule::Gitignore,
        Rule::ExcludePattern,
        Rule::KeyDirectory,
        Rule::Extension,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::ExplicitInclude => "include_files",
            Rule::HiddenSegment => "hidden",
            Rule::Gitignore => "gitignore",
            Rule::ExcludePattern => "exclude_files",
            Rule::KeyDirectory => "key_directories",
            Rule::Extension => "include_extensions",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the rule chain for one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub ignored: bool,

    /// The rule that decided, or None when no rule had an opinion
    pub rule: Option<Rule>,
}

/// Compiled ignore rules for one run
pub struct IgnoreEngine<'a> {
    config: &'a Config,
    gitignore: &'a GitignoreSpec,
    excludes: GitignoreSpec,
}

impl<'a> IgnoreEngine<'a> {
    /// Compile the engine.
    ///
    /// `exclude_files` is checked by `Config::validate`; patterns that still
    /// fail to compile here are dropped with a warning.
    pub fn new(config: &'a Config, gitignore: &'a GitignoreSpec) -> Self {
        let excludes = match GitignoreSpec::from_lines(&config.exclude_files) {
            Ok(spec) => spec,
            Err(e) => {
                log::warn!("Invalid exclude_files pattern ignored: {}", e);
                let valid: Vec<&String> = config
                    .exclude_files
                    .iter()
                    .filter(|p| GitignoreSpec::from_lines([p.as_str()]).is_ok())
                    .collect();
                GitignoreSpec::from_lines(valid).unwrap_or_else(|_| GitignoreSpec::empty())
            }
        };

        Self {
            config,
            gitignore,
            excludes,
        }
    }

    /// Run a single rule. `Some(true)` rejects, `Some(false)` accepts,
    /// `None` defers to the next rule.
    pub fn apply(&self, rule: Rule, path: &str) -> Option<bool> {
        match rule {
            Rule::ExplicitInclude => self.explicitly_included(path).then_some(false),
            Rule::HiddenSegment => segments(path).any(is_hidden).then_some(true),
            Rule::Gitignore => self.gitignore.is_match(path, false).then_some(true),
            Rule::ExcludePattern => self.excludes.is_match(path, false).then_some(true),
            Rule::KeyDirectory => {
                let keys = &self.config.key_directories;
                (!keys.is_empty() && !keys.iter().any(|k| is_under(path, k))).then_some(true)
            }
            Rule::Extension => match extension(path) {
                Some(ext) => (!self.config.allows_extension(&ext)).then_some(true),
                None => Some(true),
            },
        }
    }

    /// Evaluate the full chain for a relative file path
    pub fn decide(&self, path: &str) -> Decision {
        for rule in Rule::CHAIN {
            if let Some(ignored) = self.apply(rule, path) {
                return Decision {
                    ignored,
                    rule: Some(rule),
                };
            }
        }
        Decision {
            ignored: false,
            rule: None,
        }
    }

    /// Whether a relative file path is excluded from the collation
    pub fn should_ignore(&self, path: &str) -> bool {
        let decision = self.decide(path);
        if let (true, Some(rule)) = (decision.ignored, decision.rule) {
            log::debug!("Ignoring {} ({})", path, rule);
        }
        decision.ignored
    }

    /// Whether traversal needs to enter a directory.
    ///
    /// Returns false only when no file below `dir` could pass the chain.
    pub fn may_descend(&self, dir: &str) -> bool {
        let reaches_include = self
            .config
            .include_files
            .iter()
            .any(|entry| is_under(entry, dir) || is_under(dir, entry));
        if reaches_include {
            return true;
        }

        if segments(dir).any(is_hidden)
            || self.gitignore.is_match(dir, true)
            || self.excludes.is_match(dir, true)
        {
            return false;
        }

        let keys = &self.config.key_directories;
        keys.is_empty() || keys.iter().any(|k| is_under(dir, k) || is_under(k, dir))
    }

    /// Whether the root `.gitignore` (or infra list) hides a directory
    pub fn is_gitignored_dir(&self, dir: &str) -> bool {
        self.gitignore.is_match(dir, true)
    }

    /// Exact match, or any leading prefix when the path has a hidden segment
    fn explicitly_included(&self, path: &str) -> bool {
        let include = &self.config.include_files;
        if include.contains(path) {
            return true;
        }
        segments(path).any(is_hidden) && prefixes(path).iter().any(|p| include.contains(p))
    }
}

/// One-shot form of [`IgnoreEngine::should_ignore`]
pub fn should_ignore(path: &str, config: &Config, gitignore: &GitignoreSpec) -> bool {
    IgnoreEngine::new(config, gitignore).should_ignore(path)
}
