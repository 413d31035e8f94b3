//! Error types for model invocation and document reading.

use thiserror::Error;

/// Errors raised by a model invocation or a fan-out of invocations.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The call did not complete within the per-call timeout.
    #[error("model call timeout after {timeout_ms} ms")]
    Timeout {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },

    /// The request could not be delivered or the connection failed.
    #[error("model transport error: {0}")]
    Transport(String),

    /// The model endpoint answered with a non-success status.
    #[error("model API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("invalid model response: {0}")]
    Decode(String),

    /// The serialized request exceeds the payload ceiling.
    #[error("request payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// Serialized request size.
        size: usize,
        /// Configured ceiling.
        limit: usize,
    },

    /// The response carried no choices or no message content.
    #[error("model returned no content")]
    EmptyResponse,

    /// The API key environment variable is not set.
    #[error("{0} environment variable not set")]
    MissingApiKey(String),

    /// A fan-out branch panicked or was aborted.
    #[error("model task failed: {0}")]
    TaskFailed(String),
}

impl ModelError {
    /// Whether this failure belongs to the retryable timeout class.
    ///
    /// Transport errors count when their message reports a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            ModelError::Timeout { .. } => true,
            ModelError::Transport(msg) => msg.to_ascii_lowercase().contains("timeout")
                || msg.to_ascii_lowercase().contains("timed out"),
            _ => false,
        }
    }

    /// Structured payload returned by the endpoint, if any.
    pub fn payload(&self) -> Option<&str> {
        match self {
            ModelError::Api { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for ModelError {
    fn from(err: tokio::task::JoinError) -> Self {
        ModelError::TaskFailed(err.to_string())
    }
}

/// Errors raised while converting a document to text.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file could not be read.
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),

    /// The PDF could not be parsed.
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    /// A DOCX or PPTX archive is malformed or missing its text parts.
    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        assert!(ModelError::Timeout { timeout_ms: 120_000 }.is_timeout());
        assert!(ModelError::Transport("operation timed out".into()).is_timeout());
        assert!(ModelError::Transport("Request timeout".into()).is_timeout());
        assert!(!ModelError::Transport("connection refused".into()).is_timeout());
        assert!(!ModelError::Api {
            status: 500,
            body: String::new()
        }
        .is_timeout());
        assert!(!ModelError::EmptyResponse.is_timeout());
    }

    #[test]
    fn test_error_display() {
        let err = ModelError::Api {
            status: 429,
            body: "{\"error\":\"rate limited\"}".to_string(),
        };
        assert!(err.to_string().contains("429"));
        assert_eq!(err.payload(), Some("{\"error\":\"rate limited\"}"));

        let err = ModelError::PayloadTooLarge {
            size: 400_000,
            limit: 327_680,
        };
        assert!(err.to_string().contains("327680"));
    }
}
