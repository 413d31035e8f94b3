//! Core data models used throughout schema-scaffold.
//!
//! These types represent the document text, chunks, model requests and
//! responses, and the statements and code artifacts that flow through the
//! generation pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Page-joined text extracted from a source document.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub pages: usize,
    pub text: String,
}

/// A contiguous slice of document text.
///
/// `offset` is measured in characters from the start of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub offset: usize,
    pub text: String,
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message in a model request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One chat completion request. Built fresh for every call.
#[derive(Debug, Clone, Serialize)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

/// Message payload inside a response choice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Response of a chat completion call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ModelResponse {
    /// Build a response with a single assistant choice.
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            model: None,
            choices: vec![Choice {
                message: Some(ChoiceMessage {
                    role: Some(Role::Assistant),
                    content: Some(content.into()),
                }),
            }],
            usage: None,
        }
    }

    /// Content of the first choice, if the model returned any.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }
}

/// One `CREATE TABLE` statement taken verbatim from schema text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStatement {
    /// Table name, or `None` when it could not be parsed from the statement.
    pub name: Option<String>,
    /// Byte offset of the statement in the schema text.
    pub offset: usize,
    pub sql: String,
}

/// Generated source for a single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeArtifact {
    pub table_name: String,
    pub body: String,
}

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub schema_path: PathBuf,
    /// `None` when no statements were found and generation was skipped.
    pub output_dir: Option<PathBuf>,
    pub statements_found: usize,
    pub artifacts: Vec<PathBuf>,
}
