//! codesight - Collate a project's source files into one LLM-ready document
//!
//! The engine walks a project root, filters files through gitignore and
//! configuration rules, orders them by role, truncates large Python
//! literals and emits a single Markdown-style document with token estimates.
//!
//! ```no_run
//! use std::path::Path;
//! use codesight::core::config::ConfigBuilder;
//! use codesight::core::tokenizer::ModelEstimator;
//!
//! let config = ConfigBuilder::new().project_type("python").build()?;
//! let result = codesight::collate(Path::new("."), &config, &ModelEstimator::for_model("gpt-4"))?;
//! println!("{}", result.document);
//! # Ok::<(), codesight::CodesightError>(())
//! ```

pub mod core;
pub mod filter;
pub mod flows;
pub mod structure;
pub mod transform;

pub use crate::core::config::{Config, ConfigBuilder, ProjectType};
pub use crate::core::error::{CodesightError, FileError, Result};
pub use crate::core::tokenizer::{ModelEstimator, TokenEstimator, TokenModel};
pub use crate::filter::{should_ignore, GitignoreSpec, IgnoreEngine};
pub use crate::flows::{collate, CollationResult, FileStats};
pub use crate::structure::{generate_tree, priority_group};
pub use crate::transform::truncate;
