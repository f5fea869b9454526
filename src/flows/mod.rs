//! Flows module - End-to-end operations
//!
//! Provides:
//! - collate: Gather project files into one document with token estimates
//! - report: Render run statistics as a table or JSON

pub mod collate;
pub mod report;

pub use collate::{collate, CollationResult, FileRecord, FileStats};
pub use report::Report;
