//! End-to-end orchestration.
//!
//! ```text
//! document ─▶ read_document ─▶ Summarizer ─▶ <schema_dir>/<uuid>.sql
//!                                                   │
//!            ┌──────────────────────────────────────┘
//!            ▼
//! read_schema ─▶ extract_statements ─▶ copy template ─▶ CodeGenerator ─▶ server/models/*.<ext>
//! ```
//!
//! The two stages are also exposed on their own: [`summarize_document`]
//! stops after the schema file is written, and [`scaffold_from_schema`]
//! starts from an existing one. Any unrecovered error aborts the run; files
//! already written stay on disk.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::client::{ChatModel, RetryingClient};
use crate::codegen::CodeGenerator;
use crate::config::Config;
use crate::document::read_document;
use crate::error::ModelError;
use crate::fanout::join_fail_fast;
use crate::models::{RunReport, TableStatement};
use crate::output::{copy_template_tree, read_schema, write_artifact, write_schema};
use crate::statement::extract_statements;
use crate::summarize::Summarizer;

/// Run both stages: document to schema file to generated project.
pub async fn run(config: &Config, model: Arc<dyn ChatModel>, document: &Path) -> Result<RunReport> {
    let schema_path = summarize_document(config, model.clone(), document).await?;
    scaffold_from_schema(config, model, &schema_path).await
}

/// Stage one: summarize a document into schema SQL and persist it.
///
/// Returns the path of the written `.sql` file.
pub async fn summarize_document(
    config: &Config,
    model: Arc<dyn ChatModel>,
    document: &Path,
) -> Result<PathBuf> {
    let doc = read_document(document)
        .await
        .with_context(|| format!("Failed to read document: {}", document.display()))?;
    info!(path = %doc.path.display(), pages = doc.pages, "document loaded");

    let client = RetryingClient::from_config(model, &config.model);
    let summarizer = Summarizer::new(client, config.summarize.clone());
    let schema = summarizer
        .summarize(&doc.text)
        .await
        .map_err(|e| model_failure("summarization", e))?;

    let schema_path = write_schema(&config.output.schema_dir, &schema).await?;
    info!(path = %schema_path.display(), "schema saved");
    Ok(schema_path)
}

/// Stage two: generate per-table code from a schema file.
///
/// The run directory is `<projects_dir>/<schema file stem>`.
pub async fn scaffold_from_schema(
    config: &Config,
    model: Arc<dyn ChatModel>,
    schema_path: &Path,
) -> Result<RunReport> {
    let schema = read_schema(schema_path).await?;
    let statements = extract_statements(&schema);
    let statements_found = statements.len();

    if statements.is_empty() {
        warn!(path = %schema_path.display(), "no CREATE TABLE statements found");
        return Ok(RunReport {
            schema_path: schema_path.to_path_buf(),
            output_dir: None,
            statements_found,
            artifacts: Vec::new(),
        });
    }
    info!(statements = statements_found, "statements extracted");

    let run_name = schema_path
        .file_stem()
        .with_context(|| format!("Schema path has no file name: {}", schema_path.display()))?;
    let run_dir = config.output.projects_dir.join(run_name);

    let template_dir = config.generate.template_dir.clone();
    let excludes = config.output.exclude_globs.clone();
    let dest = run_dir.clone();
    let copied = tokio::task::spawn_blocking(move || {
        copy_template_tree(&template_dir, &dest, &excludes)
    })
    .await
    .context("Template copy task failed")??;
    info!(dir = %run_dir.display(), files = copied, "template staged");

    let template_path = config.generate.index_template_path();
    let template = tokio::fs::read_to_string(&template_path)
        .await
        .with_context(|| format!("Failed to read index template: {}", template_path.display()))?;

    let statements = dedupe_last_wins(statements);
    let client = RetryingClient::from_config(model, &config.model);
    let generator = CodeGenerator::new(client, &config.generate);
    let template: Arc<str> = Arc::from(template);
    let extension: Arc<str> = Arc::from(config.generate.extension.as_str());

    // Each branch writes its own file, so finished tables stay on disk when
    // a sibling fails.
    let branches: Vec<_> = statements
        .into_iter()
        .map(|statement| {
            let generator = generator.clone();
            let template = template.clone();
            let extension = extension.clone();
            let run_dir = run_dir.clone();
            async move {
                let generated = generator
                    .generate(&statement, &template)
                    .await
                    .map_err(|e| model_failure("code generation", e))?;
                match generated {
                    Some(artifact) => {
                        let path = write_artifact(&run_dir, &artifact, &extension).await?;
                        Ok::<_, anyhow::Error>(Some(path))
                    }
                    None => Ok(None),
                }
            }
        })
        .collect();

    let artifacts: Vec<PathBuf> = join_fail_fast(branches)
        .await?
        .into_iter()
        .flatten()
        .collect();

    info!("CRUD files generated in {}", run_dir.display());
    Ok(RunReport {
        schema_path: schema_path.to_path_buf(),
        output_dir: Some(run_dir),
        statements_found,
        artifacts,
    })
}

/// Drop earlier statements whose table name repeats later in the schema.
///
/// Unnamed statements are kept; code generation skips them.
fn dedupe_last_wins(statements: Vec<TableStatement>) -> Vec<TableStatement> {
    let mut last: HashMap<String, usize> = HashMap::new();
    for (i, s) in statements.iter().enumerate() {
        if let Some(name) = &s.name {
            last.insert(name.clone(), i);
        }
    }

    statements
        .into_iter()
        .enumerate()
        .filter(|(i, s)| match &s.name {
            Some(name) if last.get(name) != Some(i) => {
                warn!(
                    table = name.as_str(),
                    offset = s.offset,
                    "duplicate table name, keeping the later statement"
                );
                false
            }
            _ => true,
        })
        .map(|(_, s)| s)
        .collect()
}

fn model_failure(stage: &str, err: ModelError) -> anyhow::Error {
    match err.payload() {
        Some(payload) => error!(stage, error = %err, payload, "model call failed"),
        None => error!(stage, error = %err, "model call failed"),
    }
    anyhow::Error::new(err).context(format!("{} failed", stage))
}
