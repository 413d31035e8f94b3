//! # Schema Scaffold
//!
//! Turns a free-form requirements document into SQL `CREATE TABLE`
//! statements, then generates a CRUD module per table with a chat model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌────────────┐   ┌──────────────┐
//! │ Document │──▶│  Chunks    │──▶│ Summaries  │──▶│  Schema SQL  │
//! │ PDF/DOCX │   │ fixed size │   │ (parallel) │   │  <uuid>.sql  │
//! └──────────┘   └────────────┘   └────────────┘   └──────┬───────┘
//!                                                         │
//!                      ┌──────────────────────────────────┘
//!                      ▼
//!               ┌────────────┐   ┌──────────────────┐
//!               │ Statements │──▶│ Per-table code   │──▶ server/models/*.js
//!               │ CREATE ... │   │ (parallel)       │
//!               └────────────┘   └──────────────────┘
//! ```
//!
//! Every model call goes through [`client::RetryingClient`]: a per-attempt
//! timeout, up to five attempts, and retries on timeouts only. Both
//! fan-outs fail fast on the first unrecovered error.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Model and document error types |
//! | [`document`] | PDF/DOCX/PPTX/text to page-joined text |
//! | [`chunk`] | Fixed-size text chunking |
//! | [`client`] | Chat model trait, OpenAI client, retry wrapper |
//! | [`fanout`] | Fail-fast concurrent join |
//! | [`summarize`] | Chunk summaries to schema SQL |
//! | [`statement`] | `CREATE TABLE` extraction |
//! | [`codegen`] | Per-table code generation |
//! | [`output`] | Schema files, template copy, artifacts |
//! | [`pipeline`] | End-to-end orchestration |

pub mod chunk;
pub mod client;
pub mod codegen;
pub mod config;
pub mod document;
pub mod error;
pub mod fanout;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod statement;
pub mod summarize;
