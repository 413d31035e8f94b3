//! Map-reduce schema summarization.
//!
//! Stage one of the pipeline. The document is split into fixed-size chunks,
//! each chunk is condensed by its own model call (all calls in flight at
//! once), and the partial summaries are joined and handed to one final call
//! that writes the `CREATE TABLE` statements.
//!
//! ```text
//! text ─▶ split_text ─▶ [chunk 0] ─▶ condense ─┐
//!                       [chunk 1] ─▶ condense ─┼─▶ join(" ") ─▶ schema call ─▶ SchemaText
//!                       [chunk N] ─▶ condense ─┘
//! ```

use tracing::{debug, info};

use crate::chunk::split_text;
use crate::client::RetryingClient;
use crate::config::SummarizeConfig;
use crate::error::ModelError;
use crate::fanout::join_fail_fast;
use crate::models::ChatMessage;

pub struct Summarizer {
    client: RetryingClient,
    config: SummarizeConfig,
}

impl Summarizer {
    pub fn new(client: RetryingClient, config: SummarizeConfig) -> Self {
        Self { client, config }
    }

    /// Produce SQL schema text from document text.
    ///
    /// Fails with the first chunk error observed, or with the error of the
    /// final schema call.
    pub async fn summarize(&self, text: &str) -> Result<String, ModelError> {
        let chunks = split_text(text, self.config.chunk_size);
        let target = target_length(self.config.chunk_size, chunks.len());
        info!(
            chunks = chunks.len(),
            chars = text.chars().count(),
            target,
            "summarizing document"
        );

        let instruction = self.condense_instruction(target);
        let branches: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let client = self.client.clone();
                let request = client.request(
                    vec![
                        ChatMessage::system(instruction.clone()),
                        ChatMessage::user(chunk.text),
                    ],
                    self.config.temperature,
                );
                let index = chunk.index;
                async move {
                    let response = client.invoke(&request).await?;
                    let summary = response
                        .content()
                        .ok_or(ModelError::EmptyResponse)?
                        .to_string();
                    debug!(chunk = index, chars = summary.len(), "chunk condensed");
                    Ok::<_, ModelError>(summary)
                }
            })
            .collect();

        let summaries = join_fail_fast(branches).await?;
        let combined = summaries.join(" ");
        debug!(chars = combined.len(), "partial summaries joined");

        let request = self.client.request(
            vec![
                ChatMessage::system(self.schema_instruction()),
                ChatMessage::user(combined),
            ],
            self.config.temperature,
        );
        let response = self.client.invoke(&request).await?;
        let schema = response
            .content()
            .ok_or(ModelError::EmptyResponse)?
            .to_string();

        info!(chars = schema.len(), "schema text generated");
        Ok(schema)
    }

    fn condense_instruction(&self, target: usize) -> String {
        let mut instruction = self
            .config
            .condense_prompt
            .replace("{target}", &target.to_string());
        if let Some(language) = &self.config.language {
            instruction.push_str(" in ");
            instruction.push_str(language);
        }
        instruction
    }

    fn schema_instruction(&self) -> String {
        self.config.schema_prompt.replace("{domain}", &self.config.domain)
    }
}

/// Length each partial summary is asked to aim for: ceil(chunk_size / chunks).
pub fn target_length(chunk_size: usize, chunks: usize) -> usize {
    chunk_size.div_ceil(chunks.max(1))
}
