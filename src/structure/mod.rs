//! Project structure: tree preview and file ordering

pub mod priority;
pub mod tree;

pub use priority::{priority_group, sort_key, sort_paths, PriorityGroup};
pub use tree::{generate_tree, MAX_FILES_IN_DIR};
