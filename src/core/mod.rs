//! Core module - Shared plumbing for the collation engine
//!
//! This module provides:
//! - Configuration model and layered loading
//! - Error taxonomy
//! - Path normalization utilities
//! - File reading with encoding fallback
//! - Token counting for LLM context budgeting

pub mod config;
pub mod error;
pub mod file_reader;
pub mod paths;
pub mod tokenizer;
