//! # Schema Scaffold CLI (`scaffold`)
//!
//! Turns a requirements document into SQL `CREATE TABLE` statements and a
//! per-table CRUD module staged inside a copy of a project template.
//!
//! ## Usage
//!
//! ```bash
//! scaffold --config ./config/scaffold.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scaffold run <document>` | Full pipeline: document to schema to generated project |
//! | `scaffold summarize <document>` | Write the schema file only |
//! | `scaffold generate <schema.sql>` | Generate a project from an existing schema file |
//! | `scaffold statements <schema.sql>` | List the extracted `CREATE TABLE` statements |
//! | `scaffold chunks <document>` | Show how a document is split into chunks |
//!
//! `statements` and `chunks` never call the model.

use anyhow::Result;
use clap::{Parser, Subcommand};
use schema_scaffold::chunk::split_text;
use schema_scaffold::client::{ChatModel, OpenAiChatModel};
use schema_scaffold::config::{self, Config};
use schema_scaffold::document::read_document;
use schema_scaffold::output::read_schema;
use schema_scaffold::pipeline;
use schema_scaffold::statement::extract_statements;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Schema Scaffold CLI: requirements document in, CRUD project out.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file means the built-in defaults.
#[derive(Parser)]
#[command(
    name = "scaffold",
    about = "Generate a SQL schema and CRUD modules from a requirements document",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/scaffold.toml")]
    config: PathBuf,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on a document.
    ///
    /// Summarizes the document into a schema file under `schema_dir`, then
    /// generates one module per table into a new run directory under
    /// `projects_dir`.
    Run {
        /// PDF, DOCX, PPTX or plain-text document.
        document: PathBuf,
    },

    /// Summarize a document into a schema file and print its path.
    Summarize { document: PathBuf },

    /// Generate a project from an existing schema file.
    ///
    /// The run directory is named after the schema file's stem.
    Generate {
        /// Schema file containing `CREATE TABLE` statements.
        schema: PathBuf,
    },

    /// List the `CREATE TABLE` statements found in a schema file.
    Statements { schema: PathBuf },

    /// Show how a document is split into chunks.
    Chunks {
        document: PathBuf,

        /// Chunk size in characters. Defaults to `summarize.chunk_size`.
        #[arg(long)]
        chunk_size: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "schema_scaffold=debug"
    } else {
        "schema_scaffold=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Run { document } => {
            let report = pipeline::run(&cfg, chat_model(&cfg)?, &document).await?;
            println!("Schema: {}", report.schema_path.display());
            match report.output_dir {
                Some(dir) => {
                    println!(
                        "Generated {} of {} tables in {}",
                        report.artifacts.len(),
                        report.statements_found,
                        dir.display()
                    );
                    for path in &report.artifacts {
                        println!("  {}", path.display());
                    }
                }
                None => println!("No CREATE TABLE statements found."),
            }
        }
        Commands::Summarize { document } => {
            let path = pipeline::summarize_document(&cfg, chat_model(&cfg)?, &document).await?;
            println!("{}", path.display());
        }
        Commands::Generate { schema } => {
            let report = pipeline::scaffold_from_schema(&cfg, chat_model(&cfg)?, &schema).await?;
            match report.output_dir {
                Some(dir) => println!("{}", dir.display()),
                None => println!("No CREATE TABLE statements found."),
            }
        }
        Commands::Statements { schema } => {
            let text = read_schema(&schema).await?;
            let statements = extract_statements(&text);
            if statements.is_empty() {
                println!("No CREATE TABLE statements found.");
            }
            for s in &statements {
                println!(
                    "{:>6}  {}",
                    s.offset,
                    s.name.as_deref().unwrap_or("<unnamed>")
                );
            }
        }
        Commands::Chunks {
            document,
            chunk_size,
        } => {
            let chunk_size = chunk_size.unwrap_or(cfg.summarize.chunk_size);
            if chunk_size == 0 {
                anyhow::bail!("--chunk-size must be > 0");
            }
            let doc = read_document(&document).await?;
            let chunks = split_text(&doc.text, chunk_size);
            println!(
                "{} pages, {} chars, {} chunks of up to {} chars",
                doc.pages,
                doc.text.chars().count(),
                chunks.len(),
                chunk_size
            );
            for chunk in &chunks {
                println!(
                    "chunk {} @{} ({} chars)",
                    chunk.index,
                    chunk.offset,
                    chunk.text.chars().count()
                );
            }
        }
    }

    Ok(())
}

fn chat_model(cfg: &Config) -> Result<Arc<dyn ChatModel>> {
    Ok(Arc::new(OpenAiChatModel::new(&cfg.model)?))
}
