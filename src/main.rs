//! codesight - Collate a project's source files into a single LLM-ready document
//!
//! The binary resolves configuration (defaults, project-type template, user
//! TOML), runs the collation engine, writes the document and prints a
//! statistics report.

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(&cli);
    cli::run(cli)
}
