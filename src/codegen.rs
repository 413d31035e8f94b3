//! Per-table CRUD code generation.
//!
//! Stage two of the pipeline. Each named [`TableStatement`] gets its own
//! model call carrying the table name, the statement text and the index
//! template as a JSON object. The first fenced code block of the answer
//! becomes the table's [`CodeArtifact`].
//!
//! Statements without a parsable name and answers without a code block are
//! logged and skipped; they never fail the batch. A model error that
//! survives the client's retries fails the whole batch.

use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

use crate::client::RetryingClient;
use crate::config::GenerateConfig;
use crate::error::ModelError;
use crate::fanout::join_fail_fast;
use crate::models::{ChatMessage, CodeArtifact, TableStatement};

fn code_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```([\s\S]*?)```").expect("valid regex"))
}

/// Fence info strings such as `javascript` or `c++` on the opening line.
fn info_string_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w+#.-]+[ \t]*\r?\n").expect("valid regex"))
}

/// Structured context sent as the user message.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TableContext<'a> {
    table_name: &'a str,
    table_schema: &'a str,
    index_template: &'a str,
}

#[derive(Clone)]
pub struct CodeGenerator {
    client: RetryingClient,
    system_prompt: Arc<str>,
    temperature: f32,
}

impl CodeGenerator {
    pub fn new(client: RetryingClient, config: &GenerateConfig) -> Self {
        Self {
            client,
            system_prompt: Arc::from(config.system_prompt.as_str()),
            temperature: config.temperature,
        }
    }

    /// Generate code for one statement.
    ///
    /// Returns `Ok(None)` when the statement has no name or the response
    /// holds no fenced code block.
    pub async fn generate(
        &self,
        statement: &TableStatement,
        template: &str,
    ) -> Result<Option<CodeArtifact>, ModelError> {
        let Some(table_name) = statement.name.as_deref() else {
            debug!(
                offset = statement.offset,
                "statement has no parsable table name, skipping"
            );
            return Ok(None);
        };

        let context = TableContext {
            table_name,
            table_schema: &statement.sql,
            index_template: template,
        };
        let payload =
            serde_json::to_string(&context).map_err(|e| ModelError::Decode(e.to_string()))?;

        let request = self.client.request(
            vec![
                ChatMessage::system(self.system_prompt.as_ref()),
                ChatMessage::user(payload),
            ],
            self.temperature,
        );
        let response = self.client.invoke(&request).await?;

        let Some(content) = response.content() else {
            warn!(table = table_name, "model returned no content for table");
            return Ok(None);
        };

        match extract_code_block(content) {
            Some(body) => {
                debug!(table = table_name, bytes = body.len(), "code block extracted");
                Ok(Some(CodeArtifact {
                    table_name: table_name.to_string(),
                    body,
                }))
            }
            None => {
                warn!(
                    table = table_name,
                    "could not extract a code block from the model output"
                );
                Ok(None)
            }
        }
    }

    /// Generate code for every statement concurrently.
    ///
    /// Artifacts come back in statement order; skipped statements leave no
    /// entry. The first unrecovered model error rejects the batch.
    pub async fn generate_all(
        &self,
        statements: &[TableStatement],
        template: &str,
    ) -> Result<Vec<CodeArtifact>, ModelError> {
        let template: Arc<str> = Arc::from(template);
        let branches: Vec<_> = statements
            .iter()
            .cloned()
            .map(|statement| {
                let generator = self.clone();
                let template = template.clone();
                async move { generator.generate(&statement, &template).await }
            })
            .collect();

        let artifacts: Vec<CodeArtifact> = join_fail_fast(branches)
            .await?
            .into_iter()
            .flatten()
            .collect();
        info!(
            statements = statements.len(),
            artifacts = artifacts.len(),
            "code generation finished"
        );
        Ok(artifacts)
    }
}

/// Body of the first triple-backtick fenced block, without its info string.
///
/// Text on the opening fence line is an info string when it is a single
/// language-like token followed by a newline, so a block written as
/// `` ```return\n...``` `` loses that first token. A body starting on the
/// line after the fence is never trimmed beyond its leading newline.
pub fn extract_code_block(text: &str) -> Option<String> {
    let inner = code_block_re().captures(text)?.get(1)?.as_str();
    let body = match info_string_re().find(inner) {
        Some(m) => &inner[m.end()..],
        None => inner.strip_prefix('\n').unwrap_or(inner),
    };
    Some(body.to_string())
}
