//! # Precis
//!
//! Summarise text, PDF documents and audio recordings with a hosted summarisation model.
//!
//! ## Features
//!
//! - **Token-budgeted chunking**: long documents are split into overlapping windows
//! - **Sequential summarisation**: one model call per chunk, merged in document order
//! - **Multiple inputs**: PDF extraction via pdf-extract, audio via Groq Whisper
//! - **Two front ends**: a CLI and a JSON HTTP API

pub mod chunker;
pub mod client;
pub mod config;
pub mod document;
pub mod extract;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod server;
pub mod summary;
pub mod tokenizer;
pub mod transcribe;

pub use chunker::{Chunk, Chunker};
pub use config::{Config, MergePolicy, SummarizationConfig};
pub use document::{Document, Input, Provenance};
pub use pipeline::{ErrorKind, Pipeline, PipelineError};
pub use summary::Summary;
