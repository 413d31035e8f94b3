//! On-disk outputs: schema files, run directories and generated artifacts.
//!
//! ```text
//! <schema_dir>/<uuid>.sql
//! <projects_dir>/<run>/                    copy of the template tree
//! <projects_dir>/<run>/server/models/<table>.<ext>
//! ```

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::models::CodeArtifact;

/// Always skipped when copying a template tree.
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.git",
    "**/.git/**",
    "**/node_modules",
    "**/node_modules/**",
];

/// Write schema text to `<schema_dir>/<uuid>.sql` and return the path.
pub async fn write_schema(schema_dir: &Path, schema: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(schema_dir)
        .await
        .with_context(|| format!("Failed to create schema dir: {}", schema_dir.display()))?;

    let path = schema_dir.join(format!("{}.sql", uuid::Uuid::new_v4()));
    tokio::fs::write(&path, schema)
        .await
        .with_context(|| format!("Failed to write schema file: {}", path.display()))?;
    debug!(path = %path.display(), bytes = schema.len(), "schema written");
    Ok(path)
}

pub async fn read_schema(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read schema file: {}", path.display()))
}

/// Recursively copy `src` into `dest`, skipping excluded paths.
///
/// Globs are matched against paths relative to `src`. A matching directory
/// is not descended into. Returns the number of files copied.
pub fn copy_template_tree(src: &Path, dest: &Path, exclude_globs: &[String]) -> Result<usize> {
    if !src.is_dir() {
        anyhow::bail!("Template directory does not exist: {}", src.display());
    }

    let mut patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    patterns.extend(exclude_globs.iter().cloned());
    let excludes = build_globset(&patterns)?;

    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create run dir: {}", dest.display()))?;

    let mut copied = 0;
    let walker = WalkDir::new(src).into_iter().filter_entry(|entry| {
        match entry.path().strip_prefix(src) {
            Ok(rel) if !rel.as_os_str().is_empty() => !excludes.is_match(rel),
            _ => true,
        }
    });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let rel = entry.path().strip_prefix(src)?;
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            copied += 1;
        }
    }

    debug!(src = %src.display(), dest = %dest.display(), files = copied, "template copied");
    Ok(copied)
}

/// Path of a table's artifact inside a run directory.
pub fn artifact_path(run_dir: &Path, table_name: &str, extension: &str) -> PathBuf {
    run_dir
        .join("server")
        .join("models")
        .join(format!("{}.{}", table_name, extension))
}

/// Write one artifact, overwriting any file already at its path.
pub async fn write_artifact(
    run_dir: &Path,
    artifact: &CodeArtifact,
    extension: &str,
) -> Result<PathBuf> {
    let path = artifact_path(run_dir, &artifact.table_name, extension);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(&path, &artifact.body)
        .await
        .with_context(|| format!("Failed to write artifact: {}", path.display()))?;
    Ok(path)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_write_schema_uses_unique_names() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("db_schema");
        let a = write_schema(&dir, "CREATE TABLE a (id INT);").await.unwrap();
        let b = write_schema(&dir, "CREATE TABLE b (id INT);").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(a.extension().unwrap(), "sql");
        assert_eq!(a.parent().unwrap(), dir);
        assert_eq!(read_schema(&a).await.unwrap(), "CREATE TABLE a (id INT);");
    }

    #[test]
    fn test_copy_skips_default_and_configured_excludes() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("api_src");
        write(&src.join("package.json"), "{}");
        write(&src.join("server/models/index.js"), "// index");
        write(&src.join(".git/HEAD"), "ref");
        write(&src.join("node_modules/express/index.js"), "x");
        write(&src.join("server/debug.log"), "noise");

        let dest = tmp.path().join("projects/run");
        let copied =
            copy_template_tree(&src, &dest, &["**/*.log".to_string()]).unwrap();

        assert_eq!(copied, 2);
        assert!(dest.join("package.json").is_file());
        assert!(dest.join("server/models/index.js").is_file());
        assert!(!dest.join(".git").exists());
        assert!(!dest.join("node_modules").exists());
        assert!(!dest.join("server/debug.log").exists());
    }

    #[test]
    fn test_copy_missing_template_dir() {
        let tmp = TempDir::new().unwrap();
        let err = copy_template_tree(&tmp.path().join("absent"), &tmp.path().join("out"), &[])
            .unwrap_err();
        assert!(err.to_string().contains("Template directory does not exist"));
    }

    #[test]
    fn test_copy_rejects_invalid_glob() {
        let tmp = TempDir::new().unwrap();
        let err = copy_template_tree(tmp.path(), &tmp.path().join("out"), &["a[".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("Invalid glob"));
    }

    #[tokio::test]
    async fn test_write_artifact_overwrites() {
        let tmp = TempDir::new().unwrap();
        let artifact = CodeArtifact {
            table_name: "users".to_string(),
            body: "first".to_string(),
        };
        let path = write_artifact(tmp.path(), &artifact, "js").await.unwrap();
        assert_eq!(path, tmp.path().join("server/models/users.js"));

        let artifact = CodeArtifact {
            body: "second".to_string(),
            ..artifact
        };
        write_artifact(tmp.path(), &artifact, "js").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
