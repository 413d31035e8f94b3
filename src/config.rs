//! TOML configuration.
//!
//! Every section is optional; missing keys fall back to the defaults below,
//! which reproduce the stock camping-reservation setup.
//!
//! ```toml
//! [model]
//! model = "gpt-3.5-turbo"
//! timeout_secs = 120
//!
//! [summarize]
//! chunk_size = 4000
//! domain = "a library lending system"
//!
//! [generate]
//! template_dir = "./api_src"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub summarize: SummarizeConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_max_attempts() -> u32 {
    5
}
fn default_max_body_bytes() -> usize {
    8192 * 40
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizeConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Per-chunk instruction; `{target}` is replaced by the target length.
    #[serde(default = "default_condense_prompt")]
    pub condense_prompt: String,
    /// Final instruction; `{domain}` is replaced by [`SummarizeConfig::domain`].
    #[serde(default = "default_schema_prompt")]
    pub schema_prompt: String,
    #[serde(default = "default_domain")]
    pub domain: String,
    /// Language the partial summaries are written in, if not the document's own.
    #[serde(default)]
    pub language: Option<String>,
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            temperature: default_temperature(),
            condense_prompt: default_condense_prompt(),
            schema_prompt: default_schema_prompt(),
            domain: default_domain(),
            language: None,
        }
    }
}

fn default_chunk_size() -> usize {
    4000
}
fn default_temperature() -> f32 {
    0.7
}
fn default_condense_prompt() -> String {
    "Based on the current text, refine and add to {target} content or compress and summarize."
        .to_string()
}
fn default_schema_prompt() -> String {
    "Given the description of {domain}, generate the SQL schema creation statements in the form of CREATE TABLE statements."
        .to_string()
}
fn default_domain() -> String {
    "an online camping reservation platform which allows users to search and reserve camping spots based on various criteria"
        .to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerateConfig {
    #[serde(default = "default_generate_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Template tree copied into every run directory.
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    /// Reference file handed to the model, relative to `template_dir`.
    #[serde(default = "default_index_template")]
    pub index_template: PathBuf,
    /// File extension of generated artifacts.
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_generate_prompt(),
            temperature: default_temperature(),
            template_dir: default_template_dir(),
            index_template: default_index_template(),
            extension: default_extension(),
        }
    }
}

fn default_generate_prompt() -> String {
    "As an AI language model, I will generate CRUD logic for a table based on the provided table schema and index template. \
     Please provide the table name, table schema, and index template. \
     Make sure to generate complete and detailed CRUD logic, considering the index template for optimized query statements and any necessary dynamic queries."
        .to_string()
}
fn default_template_dir() -> PathBuf {
    PathBuf::from("./api_src")
}
fn default_index_template() -> PathBuf {
    PathBuf::from("server/models/index.js")
}
fn default_extension() -> String {
    "js".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,
    #[serde(default = "default_projects_dir")]
    pub projects_dir: PathBuf,
    /// Extra globs skipped when copying the template tree.
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            projects_dir: default_projects_dir(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_schema_dir() -> PathBuf {
    PathBuf::from("./db_schema")
}
fn default_projects_dir() -> PathBuf {
    PathBuf::from("./projects")
}

impl GenerateConfig {
    /// Full path of the index template reference file.
    pub fn index_template_path(&self) -> PathBuf {
        self.template_dir.join(&self.index_template)
    }
}

/// Load configuration from `path`, or the defaults when the file does not exist.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.summarize.chunk_size == 0 {
        anyhow::bail!("summarize.chunk_size must be > 0");
    }

    if config.model.max_attempts == 0 {
        anyhow::bail!("model.max_attempts must be >= 1");
    }

    if config.model.timeout_secs == 0 {
        anyhow::bail!("model.timeout_secs must be > 0");
    }

    for (key, t) in [
        ("summarize.temperature", config.summarize.temperature),
        ("generate.temperature", config.generate.temperature),
    ] {
        if !(0.0..=1.0).contains(&t) {
            anyhow::bail!("{} must be in [0.0, 1.0]", key);
        }
    }

    if !config.summarize.condense_prompt.contains("{target}") {
        anyhow::bail!("summarize.condense_prompt must contain a {{target}} placeholder");
    }

    if config.generate.extension.is_empty() || config.generate.extension.contains('/') {
        anyhow::bail!(
            "generate.extension must be a bare file extension, got '{}'",
            config.generate.extension
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scaffold.toml");
        std::fs::write(&path, content).unwrap();
        (tmp, path)
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let (_tmp, path) = write_config("");
        let config = load_config(&path).unwrap();
        assert_eq!(config.model.model, "gpt-3.5-turbo");
        assert_eq!(config.model.timeout_secs, 120);
        assert_eq!(config.model.max_attempts, 5);
        assert_eq!(config.model.max_body_bytes, 327_680);
        assert_eq!(config.summarize.chunk_size, 4000);
        assert_eq!(config.generate.extension, "js");
        assert_eq!(
            config.generate.index_template_path(),
            PathBuf::from("./api_src/server/models/index.js")
        );
    }

    #[test]
    fn test_overrides() {
        let (_tmp, path) = write_config(
            r#"
[model]
model = "gpt-4"
max_attempts = 3

[summarize]
chunk_size = 1000
domain = "a library lending system"
language = "korean"

[output]
exclude_globs = ["**/*.log"]
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.model.model, "gpt-4");
        assert_eq!(config.model.max_attempts, 3);
        assert_eq!(config.summarize.chunk_size, 1000);
        assert_eq!(config.summarize.domain, "a library lending system");
        assert_eq!(config.summarize.language.as_deref(), Some("korean"));
        assert_eq!(config.output.exclude_globs, vec!["**/*.log".to_string()]);
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let (_tmp, path) = write_config("[summarize]\nchunk_size = 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let (_tmp, path) = write_config("[generate]\ntemperature = 1.5\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("generate.temperature"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_or_default(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.output.schema_dir, PathBuf::from("./db_schema"));
    }
}
