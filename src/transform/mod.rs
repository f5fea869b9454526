//! Source transforms applied before a file is embedded

pub mod python;

pub use python::truncate;
