use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn scaffold_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_scaffold"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let template_dir = root.join("api_src/server/models");
    fs::create_dir_all(&template_dir).unwrap();
    fs::write(template_dir.join("index.js"), "module.exports = {};").unwrap();

    fs::write(
        root.join("schema.sql"),
        "Here is the schema.\n\nCREATE TABLE users (\n  id INT PRIMARY KEY\n);\n\nCREATE TABLE IF NOT EXISTS `campsites` (\n  id INT,\n  price DECIMAL(10, 2)\n);\n",
    )
    .unwrap();
    fs::write(root.join("brief.txt"), "abcdefghij".repeat(25)).unwrap();

    let config_content = format!(
        r#"[model]
api_key_env = "SCAFFOLD_INTEGRATION_UNSET_KEY"

[summarize]
chunk_size = 100

[generate]
template_dir = "{root}/api_src"

[output]
schema_dir = "{root}/db_schema"
projects_dir = "{root}/projects"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("scaffold.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_scaffold(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = scaffold_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("SCAFFOLD_INTEGRATION_UNSET_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run scaffold binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_statements_lists_tables() {
    let (tmp, config) = setup_test_env();
    let schema = tmp.path().join("schema.sql");

    let (stdout, stderr, success) = run_scaffold(&config, &["statements", schema.to_str().unwrap()]);
    assert!(success, "statements failed: {}", stderr);

    let names: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .collect();
    assert_eq!(names, vec!["users", "campsites"]);
}

#[test]
fn test_statements_none_found() {
    let (tmp, config) = setup_test_env();
    let schema = tmp.path().join("empty.sql");
    fs::write(&schema, "No tables were generated.").unwrap();

    let (stdout, _, success) = run_scaffold(&config, &["statements", schema.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("No CREATE TABLE statements found."));
}

#[test]
fn test_chunks_uses_configured_size() {
    let (tmp, config) = setup_test_env();
    let brief = tmp.path().join("brief.txt");

    let (stdout, stderr, success) = run_scaffold(&config, &["chunks", brief.to_str().unwrap()]);
    assert!(success, "chunks failed: {}", stderr);

    // "Page 1: " + 250 chars + "\n\n" = 260 chars -> 3 chunks of 100
    assert!(stdout.contains("1 pages, 260 chars, 3 chunks of up to 100 chars"));
    assert!(stdout.contains("chunk 2 @200 (60 chars)"));
}

#[test]
fn test_chunks_size_override() {
    let (tmp, config) = setup_test_env();
    let brief = tmp.path().join("brief.txt");

    let (stdout, _, success) = run_scaffold(
        &config,
        &["chunks", brief.to_str().unwrap(), "--chunk-size", "1000"],
    );
    assert!(success);
    assert!(stdout.contains("1 chunks of up to 1000 chars"));
    assert!(stdout.contains("chunk 0 @0 (260 chars)"));
}

#[test]
fn test_chunks_rejects_zero_size() {
    let (tmp, config) = setup_test_env();
    let brief = tmp.path().join("brief.txt");

    let (_, stderr, success) = run_scaffold(
        &config,
        &["chunks", brief.to_str().unwrap(), "--chunk-size", "0"],
    );
    assert!(!success);
    assert!(stderr.contains("--chunk-size must be > 0"));
}

#[test]
fn test_run_requires_api_key() {
    let (tmp, config) = setup_test_env();
    let brief = tmp.path().join("brief.txt");

    let (_, stderr, success) = run_scaffold(&config, &["run", brief.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("SCAFFOLD_INTEGRATION_UNSET_KEY environment variable not set"));
    assert!(!tmp.path().join("db_schema").exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let (tmp, config) = setup_test_env();
    fs::write(&config, "[summarize]\nchunk_size = 0\n").unwrap();
    let brief = tmp.path().join("brief.txt");

    let (_, stderr, success) = run_scaffold(&config, &["chunks", brief.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("chunk_size"));
}

#[test]
fn test_missing_document() {
    let (tmp, config) = setup_test_env();
    let missing = tmp.path().join("absent.txt");

    let (_, _, success) = run_scaffold(&config, &["chunks", missing.to_str().unwrap()]);
    assert!(!success);
}
