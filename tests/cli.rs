use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn codesight() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("codesight"))
}

fn sample_project() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sample_project")
}

fn headers(document: &str) -> Vec<&str> {
    document
        .lines()
        .filter_map(|l| l.strip_prefix("### "))
        .collect()
}

#[test]
fn collates_into_output_file() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("test.py"), "print('hello')\n");
    write_file(&temp.path().join("README.md"), "# Test\n");
    write_file(&temp.path().join("ignore.pyc"), "compiled");
    let output = temp.path().join("collated.txt");

    codesight()
        .arg("--root")
        .arg(temp.path())
        .arg("--output")
        .arg(&output)
        .arg("--model")
        .arg("heuristic")
        .arg("--no-color")
        .assert()
        .success()
        .stderr(predicate::str::contains("File Statistics"))
        .stderr(predicate::str::contains("collated.txt"));

    let document = fs::read_to_string(&output).unwrap();
    assert_eq!(headers(&document), vec!["README.md", "test.py"]);
    assert!(document.contains("print('hello')"));
    assert!(!document.contains("ignore.pyc"));
}

#[test]
fn stdout_prints_document() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("app.py"), "x = 1\n");

    codesight()
        .arg("--root")
        .arg(temp.path())
        .arg("--stdout")
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("```\n"))
        .stdout(predicate::str::contains("### app.py\n\n```py\nx = 1\n```\n"))
        .stderr(predicate::str::is_empty());

    assert!(!temp.path().join("codesight_source.txt").exists());
}

#[test]
fn output_file_is_not_collated_on_rerun() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("app.py"), "x = 1\n");
    let output = temp.path().join("collated.md");

    for _ in 0..2 {
        codesight()
            .arg("--root")
            .arg(temp.path())
            .arg("--output")
            .arg(&output)
            .arg("--quiet")
            .assert()
            .success();
    }

    let document = fs::read_to_string(&output).unwrap();
    assert_eq!(headers(&document), vec!["app.py"]);
}

#[test]
fn json_report_lists_files_and_errors() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("README.md"), "# Test\n");
    fs::write(temp.path().join("blob.py"), [0u8, 1, 2, 3]).unwrap();
    let output = temp.path().join("out.txt");

    let assert = codesight()
        .arg("--root")
        .arg(temp.path())
        .arg("--output")
        .arg(&output)
        .arg("--format")
        .arg("json")
        .arg("--model")
        .arg("heuristic")
        .assert()
        .success();

    let report: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(report["project_type"], "unopinionated");
    assert!(report["total_tokens"].as_u64().unwrap() > 0);
    assert_eq!(report["files"]["README.md"]["lines"], 1);
    assert_eq!(report["errors"][0]["path"], "blob.py");
}

#[test]
fn unknown_model_leaves_tokens_empty() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("app.py"), "x = 1\n");

    let assert = codesight()
        .arg("--root")
        .arg(temp.path())
        .arg("--stdout")
        .arg("--format")
        .arg("json")
        .arg("--model")
        .arg("no-such-model")
        .assert()
        .success();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr);
    let json_line = stderr
        .lines()
        .find(|l| l.starts_with('{'))
        .expect("json report on stderr");
    let report: Value = serde_json::from_str(json_line).unwrap();
    assert!(report["total_tokens"].is_null());
    assert!(report["files"]["app.py"]["tokens"].is_null());
}

#[test]
fn missing_root_fails() {
    let temp = tempdir().unwrap();

    codesight()
        .arg("--root")
        .arg(temp.path().join("missing"))
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("root path does not exist"));
}

#[test]
fn invalid_user_config_fails() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("app.py"), "x = 1\n");
    let config = temp.path().join("codesight.toml");
    write_file(&config, "include_extensions = [\"py\"]\n");

    codesight()
        .arg("--root")
        .arg(temp.path())
        .arg("--user-config")
        .arg(&config)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be a suffix starting with '.'"));
}

#[test]
fn non_toml_user_config_fails() {
    let temp = tempdir().unwrap();
    let config = temp.path().join("codesight.yaml");
    write_file(&config, "include_extensions: [.py]\n");

    codesight()
        .arg("--root")
        .arg(temp.path())
        .arg("--user-config")
        .arg(&config)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported config file format"));
}

#[test]
fn user_config_overrides_defaults() {
    let temp = tempdir().unwrap();
    write_file(&temp.path().join("app.py"), "x = 1\n");
    write_file(&temp.path().join("query.sql"), "select 1;\n");
    write_file(&temp.path().join("style.css"), "body {}\n");
    let config = temp.path().join("codesight.toml");
    write_file(
        &config,
        "include_extensions = [\".css\", \".py\"]\n\n[file_docs]\n\"style.css\" = \"Site styles\"\n",
    );

    let assert = codesight()
        .arg("--root")
        .arg(temp.path())
        .arg("--user-config")
        .arg(&config)
        .arg("--stdout")
        .arg("--quiet")
        .assert()
        .success();

    let document = String::from_utf8_lossy(&assert.get_output().stdout);
    assert_eq!(headers(&document), vec!["app.py", "style.css"]);
    assert!(document.contains("### style.css\nDOCUMENTATION: Site styles\n"));
}

#[test]
fn sample_project_uses_python_template() {
    let assert = codesight()
        .arg("--root")
        .arg(sample_project())
        .arg("--stdout")
        .arg("--quiet")
        .arg("--model")
        .arg("heuristic")
        .assert()
        .success();

    let document = String::from_utf8_lossy(&assert.get_output().stdout);
    assert_eq!(
        headers(&document),
        vec![
            "README.md",
            "pyproject.toml",
            "src/sample/__init__.py",
            "src/sample/core.py",
            "tests/test_core.py",
        ]
    );
    assert!(document.contains("DOCUMENTATION: Project documentation and usage guide"));
    assert!(document.contains("PRIMES = [2, 3, 5, 7, 11]\n"));
    assert!(document.contains("    \"magenta\": \"#ff00ff\",\n}"));
    assert!(!document.contains("\"yellow\""));
    assert!(!document.contains("### docs/usage.md"));
    assert!(!document.contains("### notes.txt"));
    // The tree preview still shows directories outside the key directories
    assert!(document.contains("├── docs/"));
}

#[test]
fn forced_type_skips_detection() {
    let assert = codesight()
        .arg("--root")
        .arg(sample_project())
        .arg("--type")
        .arg("unopinionated")
        .arg("--stdout")
        .arg("--quiet")
        .assert()
        .success();

    let document = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(document.contains("### docs/usage.md"));
    assert!(!document.contains("DOCUMENTATION:"));
}
