//! Ignore engine
//!
//! Decides, for any path relative to the collation root, whether it is part
//! of the collation. Combines the root `.gitignore`, hidden-path rules and
//! the configured allow/deny lists.

pub mod gitignore;
pub mod rules;

pub use gitignore::GitignoreSpec;
pub use rules::{should_ignore, Decision, IgnoreEngine, Rule};
