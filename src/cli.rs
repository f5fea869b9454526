//! CLI module - Command-line interface definition and handler

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use codesight::core::config::{detect_project_type, Config, ConfigBuilder, ProjectType};
use codesight::core::paths::make_relative;
use codesight::core::tokenizer::ModelEstimator;
use codesight::flows::{collate, Report};

/// codesight - collate a project's source files into one LLM-ready document.
#[derive(Parser, Debug)]
#[command(name = "codesight")]
#[command(
    author,
    version,
    about,
    long_about = r#"codesight scans a project, keeps the files that matter and writes them into a
single document: a directory tree preview followed by one fenced block per file,
ordered so that manifests and entry points come first.

Files are filtered by the root .gitignore, hidden-path rules and the configured
extension allow-list. Large list/dict/set literals in Python files are truncated.
A statistics table with per-file token estimates is printed to stderr.

Examples:
    codesight                          # Scan the current directory
    codesight --root ./myproject       # Scan a specific directory
    codesight --type python            # Force the Python template
    codesight --stdout | less          # Print the document instead of writing it
    codesight --format json            # Machine-readable statistics
"#
)]
pub struct Cli {
    /// Root directory to scan.
    #[arg(
        long,
        default_value = ".",
        value_name = "ROOT",
        long_help = "Root directory to scan (defaults to the current directory).\n\n\
All paths in the document and the statistics are relative to this root."
    )]
    pub root: PathBuf,

    /// Output file for the collated document.
    #[arg(
        short,
        long,
        default_value = "codesight_source.txt",
        value_name = "FILE",
        long_help = "File the collated document is written to.\n\n\
When the file lies inside ROOT it is never collated itself."
    )]
    pub output: PathBuf,

    /// Print the document to stdout instead of writing a file.
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,

    /// Force a project type (python/javascript/unopinionated).
    #[arg(
        long = "type",
        value_name = "TYPE",
        long_help = "Force a specific project type.\n\n\
By default the type is detected from marker files at ROOT:\n\
- python: pyproject.toml, setup.py or requirements.txt\n\
- javascript: package.json or package-lock.json\n\
- unopinionated: anything else (no template is applied)"
    )]
    pub project_type: Option<ProjectType>,

    /// TOML file overriding the default configuration.
    #[arg(
        long,
        value_name = "FILE",
        long_help = "Path to a TOML configuration file merged over the defaults and the\n\
project-type template. Tables merge key by key, any other value replaces the default."
    )]
    pub user_config: Option<PathBuf>,

    /// Model name used for token estimation.
    #[arg(
        long,
        env = "CODESIGHT_MODEL",
        default_value = "gpt-4",
        value_name = "MODEL",
        long_help = "Model name used for token estimation.\n\n\
Supported: cl100k, o200k, gpt-4, gpt-4o, gpt-3.5-turbo, claude-3, heuristic.\n\
Unknown names leave token counts empty instead of failing."
    )]
    pub model: String,

    /// Statistics format (text/json).
    #[arg(
        long,
        value_enum,
        default_value_t = ReportFormat::Text,
        value_name = "FORMAT",
        long_help = "Format of the run statistics.\n\n\
- text (default): colored table on stderr\n\
- json: a single JSON object on stdout (stderr when --stdout is used)"
    )]
    pub format: ReportFormat,

    /// Pretty-print JSON statistics.
    #[arg(long)]
    pub pretty: bool,

    /// Disable colored output.
    #[arg(
        long,
        long_help = "Disable colored output. This is useful when piping to files or when your\n\
terminal does not support ANSI colors."
    )]
    pub no_color: bool,

    /// Quiet mode (errors only, no statistics table).
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug diagnostics).
    #[arg(
        short,
        long,
        long_help = "Enable debug diagnostics on stderr, including the rule that excluded\n\
each skipped file."
    )]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Install the stderr logger. `RUST_LOG` applies unless a verbosity flag is given.
pub fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let project_type = cli
        .project_type
        .unwrap_or_else(|| detect_project_type(&cli.root));
    log::debug!("Project type: {}", project_type);

    let mut config = load_config(project_type, cli.user_config.as_deref())?;
    if !cli.stdout {
        exclude_output(&mut config, &cli.root, &cli.output);
    }

    let estimator = ModelEstimator::for_model(&cli.model);
    let result = collate(&cli.root, &config, &estimator)
        .with_context(|| format!("Failed to collate {}", cli.root.display()))?;

    if cli.stdout {
        print!("{}", result.document);
    } else {
        fs::write(&cli.output, &result.document).with_context(|| {
            format!("Failed to write output file {}", cli.output.display())
        })?;
        log::info!("Output written to {}", cli.output.display());
    }

    let output = (!cli.stdout).then_some(cli.output.as_path());
    let report = Report::new(&result, project_type.as_str(), output);
    match cli.format {
        ReportFormat::Json => {
            let json = report.to_json(cli.pretty)?;
            if cli.stdout {
                eprintln!("{}", json);
            } else {
                println!("{}", json);
            }
        }
        ReportFormat::Text => {
            if !cli.quiet {
                eprint!("{}", report.render_text());
            }
        }
    }

    Ok(())
}

fn load_config(project_type: ProjectType, user_config: Option<&Path>) -> Result<Config> {
    let mut builder = ConfigBuilder::new();
    if project_type != ProjectType::Unopinionated {
        builder = builder.project_type(project_type.as_str());
    }
    if let Some(path) = user_config {
        builder = builder
            .user_config_file(path)
            .with_context(|| format!("Failed to load user config {}", path.display()))?;
        log::debug!("Using custom configuration from {}", path.display());
    }
    builder.build().context("Invalid configuration")
}

/// Keep the output file out of its own collation when it lies inside the root
fn exclude_output(config: &mut Config, root: &Path, output: &Path) {
    if let Some(rel) = output_under_root(root, output) {
        log::debug!("Excluding output file {}", rel);
        config.exclude_files.push(format!("/{}", escape_glob(&rel)));
    }
}

fn output_under_root(root: &Path, output: &Path) -> Option<String> {
    let root = root.canonicalize().ok()?;
    let name = output.file_name()?;
    let parent = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let abs = parent.canonicalize().ok()?.join(name);
    make_relative(&abs, &root)
}

fn escape_glob(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
