//! Run report - Per-file statistics for the terminal or as JSON

use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::error::FileError;
use crate::flows::collate::{CollationResult, FileStats};

/// Number of files listed individually in the text report
pub const TOP_FILES: usize = 10;

/// Summary of one run, serializable as the JSON report
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub project_type: &'a str,
    pub output: Option<String>,
    pub total_tokens: Option<usize>,
    pub total_lines: usize,
    pub files: &'a BTreeMap<String, FileStats>,
    pub errors: &'a [FileError],
}

impl<'a> Report<'a> {
    pub fn new(result: &'a CollationResult, project_type: &'a str, output: Option<&Path>) -> Self {
        Self {
            project_type,
            output: output.map(|p| p.display().to_string()),
            total_tokens: result.total_tokens,
            total_lines: result.total_lines(),
            files: &result.stats,
            errors: &result.errors,
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// Render the statistics table, info lines and error table
    pub fn render_text(&self) -> String {
        let mut out = self.render_stats();
        out.push('\n');
        out.push_str(&self.render_info());
        if !self.errors.is_empty() {
            out.push('\n');
            out.push_str(&self.render_errors());
        }
        out
    }

    fn render_stats(&self) -> String {
        let mut ranked: Vec<(&String, &FileStats)> = self.files.iter().collect();
        ranked.sort_by(|a, b| {
            b.1.tokens
                .unwrap_or(0)
                .cmp(&a.1.tokens.unwrap_or(0))
                .then_with(|| a.0.cmp(b.0))
        });

        let mut rows: Vec<[String; 4]> = ranked
            .iter()
            .take(TOP_FILES)
            .map(|(path, stats)| {
                let (dir, name) = split_path(path);
                [
                    dir.to_string(),
                    name.to_string(),
                    fmt_tokens(stats.tokens),
                    fmt_count(stats.lines),
                ]
            })
            .collect();

        let rest = ranked.get(TOP_FILES..).unwrap_or(&[]);
        if !rest.is_empty() {
            rows.push([
                "Other files".to_string(),
                format!("{} files", rest.len()),
                fmt_tokens(sum_tokens(rest.iter().map(|(_, s)| *s))),
                fmt_count(rest.iter().map(|(_, s)| s.lines).sum()),
            ]);
        }
        let other_row = !rest.is_empty();

        let total = [
            "Total".to_string(),
            format!("+{} files", self.files.len()),
            self.total_tokens.map(fmt_count).unwrap_or_default(),
            fmt_count(self.total_lines),
        ];

        let header = ["Path", "File", "Tokens", "Lines"];
        let mut widths = header.map(str::len);
        for row in rows.iter().chain(std::iter::once(&total)) {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        out.push_str(&format!("{}\n", "File Statistics".bold()));
        out.push_str(&border('┌', '┬', '┐', &widths));
        out.push_str(&format!(
            "│ {} │ {} │ {} │ {} │\n",
            pad_left(header[0], widths[0]).bold(),
            pad_left(header[1], widths[1]).bold(),
            pad_right(header[2], widths[2]).bold(),
            pad_right(header[3], widths[3]).bold(),
        ));
        out.push_str(&border('├', '┼', '┤', &widths));

        let last_top = rows.len().saturating_sub(usize::from(other_row));
        for (i, row) in rows.iter().enumerate() {
            let cells = [
                pad_left(&row[0], widths[0]),
                pad_left(&row[1], widths[1]),
                pad_right(&row[2], widths[2]),
                pad_right(&row[3], widths[3]),
            ];
            let line = if i >= last_top {
                format!(
                    "│ {} │ {} │ {} │ {} │\n",
                    cells[0].dimmed(),
                    cells[1].dimmed(),
                    cells[2].dimmed(),
                    cells[3].dimmed()
                )
            } else {
                let dir = if row[0] == "root" {
                    cells[0].dimmed().italic()
                } else {
                    cells[0].blue()
                };
                format!(
                    "│ {} │ {} │ {} │ {} │\n",
                    dir,
                    cells[1].cyan(),
                    cells[2].green(),
                    cells[3].yellow()
                )
            };
            out.push_str(&line);
        }

        out.push_str(&border('├', '┼', '┤', &widths));
        out.push_str(&format!(
            "│ {} │ {} │ {} │ {} │\n",
            pad_left(&total[0], widths[0]).bold(),
            pad_left(&total[1], widths[1]).bold(),
            pad_right(&total[2], widths[2]).bold(),
            pad_right(&total[3], widths[3]).bold(),
        ));
        out.push_str(&border('└', '┴', '┘', &widths));
        out
    }

    fn render_info(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {}\n",
            "Project".bright_black(),
            self.project_type.blue()
        ));
        if let Some(output) = &self.output {
            let name = Path::new(output)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| output.clone());
            out.push_str(&format!("{} {}\n", "Output ".bright_black(), name));
        }
        out
    }

    fn render_errors(&self) -> String {
        let mut out = format!("{}\n", "Errors encountered:".red().bold());
        let width = self
            .errors
            .iter()
            .map(|e| e.path.chars().count())
            .max()
            .unwrap_or(0)
            .max(4);
        for err in self.errors {
            out.push_str(&format!(
                "  {}  {}\n",
                pad_left(&err.path, width).cyan(),
                err.message.red()
            ));
        }
        out
    }
}

/// Split a relative path into its directory (`root` at top level) and file name
fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("root", path),
    }
}

fn sum_tokens<'s>(stats: impl Iterator<Item = &'s FileStats>) -> Option<usize> {
    stats.map(|s| s.tokens).sum()
}

fn fmt_tokens(tokens: Option<usize>) -> String {
    tokens.map(fmt_count).unwrap_or_else(|| "-".to_string())
}

/// Format a count with thousands separators (`12,345`)
pub fn fmt_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn pad_left(s: &str, width: usize) -> String {
    format!("{:<width$}", s, width = width)
}

fn pad_right(s: &str, width: usize) -> String {
    format!("{:>width$}", s, width = width)
}

fn border(left: char, mid: char, right: char, widths: &[usize; 4]) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!(
        "{}{}{}\n",
        left,
        segments.join(&mid.to_string()),
        right
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(tokens: Option<usize>, lines: usize) -> FileStats {
        FileStats {
            tokens,
            lines,
            encoding: "UTF-8".into(),
            ..FileStats::default()
        }
    }

    fn result(n: usize) -> CollationResult {
        let mut result = CollationResult {
            total_tokens: Some(12_345),
            ..CollationResult::default()
        };
        for i in 0..n {
            result
                .stats
                .insert(format!("src/mod_{:02}.py", i), stats(Some(i * 10), 2));
        }
        result
    }

    #[test]
    fn test_fmt_count() {
        assert_eq!(fmt_count(0), "0");
        assert_eq!(fmt_count(999), "999");
        assert_eq!(fmt_count(1_000), "1,000");
        assert_eq!(fmt_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_split_path() {
        assert_eq!(split_path("README.md"), ("root", "README.md"));
        assert_eq!(split_path("src/pkg/app.py"), ("src/pkg", "app.py"));
    }

    #[test]
    fn test_text_report_top_files_and_rollup() {
        colored::control::set_override(false);
        let result = result(13);
        let report = Report::new(&result, "python", Some(Path::new("out/codesight_source.txt")));
        let text = report.render_text();

        assert!(text.contains("mod_12.py"));
        assert!(text.contains("mod_03.py"));
        assert!(!text.contains("mod_02.py"));
        assert!(text.contains("Other files"));
        assert!(text.contains("3 files"));
        assert!(text.contains("+13 files"));
        let total = text.lines().find(|l| l.contains("Total")).unwrap();
        assert!(total.ends_with(" 26 │"));
        assert!(text.contains("12,345"));
        assert!(text.contains("python"));
        assert!(text.contains("codesight_source.txt"));
        assert!(!text.contains("Errors encountered"));
    }

    #[test]
    fn test_text_report_unknown_tokens() {
        colored::control::set_override(false);
        let mut result = result(1);
        result.total_tokens = None;
        result.stats.insert("README.md".into(), stats(None, 4));
        result.errors.push(FileError::new("blob.py", "file appears to be binary"));

        let text = Report::new(&result, "unopinionated", None).render_text();
        assert!(text.contains("root"));
        assert!(text.contains("Errors encountered:"));
        assert!(text.contains("blob.py"));
        assert!(!text.contains("Output"));
    }

    #[test]
    fn test_json_report() {
        let mut result = result(2);
        result.errors.push(FileError::new("blob.py", "binary"));
        let json = Report::new(&result, "python", Some(Path::new("out.txt")))
            .to_json(false)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["project_type"], "python");
        assert_eq!(value["output"], "out.txt");
        assert_eq!(value["total_tokens"], 12_345);
        assert_eq!(value["total_lines"], 4);
        assert_eq!(value["files"]["src/mod_01.py"]["tokens"], 10);
        assert_eq!(value["files"]["src/mod_01.py"]["lines"], 2);
        assert_eq!(value["errors"][0]["path"], "blob.py");
    }
}
