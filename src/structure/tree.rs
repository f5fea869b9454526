//! Directory tree preview
//!
//! Renders the project layout as a fenced text block. Directories come
//! before files at each level, both ordered case-insensitively. Every
//! non-hidden directory is shown. Files are only listed when they pass the
//! ignore rules, and at most [`MAX_FILES_IN_DIR`] are listed per directory.

use std::cmp::Ordering;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

use crate::core::paths::{is_hidden, make_relative};
use crate::filter::IgnoreEngine;

/// Maximum number of files listed per directory
pub const MAX_FILES_IN_DIR: usize = 10;

#[derive(Debug, Default)]
struct DirNode {
    name: String,
    dirs: Vec<DirNode>,
    files: Vec<String>,
}

/// Render the tree preview for `root`. Ends with the closing fence and a newline.
pub fn generate_tree(root: &Path, engine: &IgnoreEngine) -> String {
    let tree = build(root, engine);

    let mut lines = vec!["```".to_string(), tree.name.clone()];
    render_children(&tree, "", &mut lines);
    lines.push("```".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Display name of the root directory
pub fn root_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_os_string())
        .or_else(|| {
            root.canonicalize()
                .ok()
                .and_then(|p| p.file_name().map(|n| n.to_os_string()))
        })
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

fn build(root: &Path, engine: &IgnoreEngine) -> DirNode {
    let mut walker = WalkDir::new(root).sort_by(compare_entries).into_iter();

    // Pre-order walk: `stack[i]` is the open directory at depth i
    let mut stack = vec![DirNode {
        name: root_name(root),
        ..Default::default()
    }];

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::debug!("Skipping unreadable entry in tree preview: {}", e);
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }

        while stack.len() > entry.depth() {
            close_dir(&mut stack);
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().is_dir() {
            if is_hidden(&name) {
                walker.skip_current_dir();
                continue;
            }
            if !lists_files(&entry, root, engine) {
                walker.skip_current_dir();
            }
            stack.push(DirNode {
                name,
                ..Default::default()
            });
        } else if entry.file_type().is_file() {
            let included = make_relative(entry.path(), root)
                .map(|rel| !engine.should_ignore(&rel))
                .unwrap_or(false);
            if included {
                if let Some(top) = stack.last_mut() {
                    top.files.push(name);
                }
            }
        }
    }

    while stack.len() > 1 {
        close_dir(&mut stack);
    }
    stack.pop().unwrap_or_default()
}

fn close_dir(stack: &mut Vec<DirNode>) {
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.dirs.push(done);
        }
    }
}

/// Gitignored directories are shown without their contents unless an
/// explicit include lies beneath them
fn lists_files(entry: &DirEntry, root: &Path, engine: &IgnoreEngine) -> bool {
    match make_relative(entry.path(), root) {
        Some(rel) => !engine.is_gitignored_dir(&rel) || engine.may_descend(&rel),
        None => false,
    }
}

fn compare_entries(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    b_dir.cmp(&a_dir).then_with(|| {
        let a_name = a.file_name().to_string_lossy();
        let b_name = b.file_name().to_string_lossy();
        a_name
            .to_lowercase()
            .cmp(&b_name.to_lowercase())
            .then_with(|| a_name.cmp(&b_name))
    })
}

fn render_children(node: &DirNode, prefix: &str, lines: &mut Vec<String>) {
    let shown = node.files.len().min(MAX_FILES_IN_DIR);
    let hidden = node.files.len() - shown;
    let total = node.dirs.len() + shown + usize::from(hidden > 0);
    let mut index = 0;

    for dir in &node.dirs {
        index += 1;
        let last = index == total;
        lines.push(format!("{}{}{}/", prefix, connector(last), dir.name));
        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render_children(dir, &child_prefix, lines);
    }

    for file in node.files.iter().take(shown) {
        index += 1;
        lines.push(format!("{}{}{}", prefix, connector(index == total), file));
    }

    if hidden > 0 {
        lines.push(format!("{}└── ... ({} more files)", prefix, hidden));
    }
}

fn connector(last: bool) -> &'static str {
    if last {
        "└── "
    } else {
        "├── "
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::filter::GitignoreSpec;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn render(root: &Path, config: &Config) -> String {
        let spec = GitignoreSpec::load(root);
        let engine = IgnoreEngine::new(config, &spec);
        generate_tree(root, &engine)
    }

    #[test]
    fn test_fenced_block() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app.py");

        let tree = render(dir.path(), &Config::default());
        assert!(tree.starts_with("```\n"));
        assert!(tree.ends_with("```\n"));
        let name = dir.path().file_name().unwrap().to_string_lossy();
        assert_eq!(tree.lines().nth(1), Some(name.as_ref()));
    }

    #[test]
    fn test_root_name_without_final_component() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let name = dir.path().file_name().unwrap().to_string_lossy();
        assert_eq!(root_name(&dir.path().join("sub").join("..")), name);
        assert_eq!(root_name(dir.path()), name);
    }

    #[test]
    fn test_layout() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "README.md");
        touch(dir.path(), "src/pkg/app.py");
        touch(dir.path(), "src/Util.py");
        touch(dir.path(), "src/style.css");
        touch(dir.path(), "docs/index.md");

        let tree = render(dir.path(), &Config::default());
        let body: Vec<&str> = tree.lines().skip(2).collect();
        assert_eq!(
            body,
            vec![
                "├── docs/",
                "│   └── index.md",
                "├── src/",
                "│   ├── pkg/",
                "│   │   └── app.py",
                "│   └── Util.py",
                "└── README.md",
                "```",
            ]
        );
    }

    #[test]
    fn test_hidden_dirs_not_shown() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), ".git/config.py");
        touch(dir.path(), ".venv/lib/site.py");
        touch(dir.path(), "main.py");

        let tree = render(dir.path(), &Config::default());
        assert!(!tree.contains(".git"));
        assert!(!tree.contains(".venv"));
        assert!(tree.contains("└── main.py"));
    }

    #[test]
    fn test_ignored_dirs_shown_without_contents() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "build/a.py");
        touch(dir.path(), "dist/b.py");
        touch(dir.path(), "node_modules/pkg/index.py");
        touch(dir.path(), "main.py");
        fs::write(dir.path().join(".gitignore"), "/build/\n").unwrap();

        let tree = render(dir.path(), &Config::default());
        let body: Vec<&str> = tree.lines().skip(2).collect();
        assert_eq!(
            body,
            vec![
                "├── build/",
                "├── dist/",
                "│   └── b.py",
                "├── node_modules/",
                "└── main.py",
                "```",
            ]
        );
    }

    #[test]
    fn test_ignored_dir_lists_explicit_include() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "build/keep.py");
        touch(dir.path(), "build/drop.py");
        fs::write(dir.path().join(".gitignore"), "build/\n").unwrap();

        let mut config = Config::default();
        config.include_files.insert("build/keep.py".into());
        let tree = render(dir.path(), &config);
        assert!(tree.contains("└── build/"));
        assert!(tree.contains("    └── keep.py"));
        assert!(!tree.contains("drop.py"));
    }

    #[test]
    fn test_files_capped_per_directory() {
        let dir = TempDir::new().unwrap();
        for i in 0..13 {
            touch(dir.path(), &format!("pkg/mod_{:02}.py", i));
        }

        let tree = render(dir.path(), &Config::default());
        assert!(tree.contains("    ├── mod_09.py"));
        assert!(!tree.contains("mod_10.py"));
        assert!(tree.contains("    └── ... (3 more files)"));
    }

    #[test]
    fn test_exactly_cap_files_has_no_remainder_line() {
        let dir = TempDir::new().unwrap();
        for i in 0..MAX_FILES_IN_DIR {
            touch(dir.path(), &format!("m{}.py", i));
        }

        let tree = render(dir.path(), &Config::default());
        assert!(!tree.contains("more files"));
        assert!(tree.contains("└── m9.py"));
    }
}
