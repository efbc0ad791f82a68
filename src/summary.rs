//! Summary struct - the output of one pipeline run.

use crate::document::Provenance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final summary of a document together with the text it was produced from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// Input modality of the source
    pub provenance: Provenance,
    /// Full extracted, transcribed or submitted text
    pub source_text: String,
    /// The summary itself
    pub text: String,
    /// Number of chunks the source was split into (0 for blank input)
    pub chunk_count: usize,
    /// Whether the chunk summaries were summarised a second time
    pub resummarized: bool,
    /// Model identifier used for generation
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

impl Summary {
    /// Summary of a document with no text in it
    pub fn empty(provenance: Provenance, source_text: String, model: String) -> Self {
        Self {
            provenance,
            source_text,
            text: String::new(),
            chunk_count: 0,
            resummarized: false,
            model,
            generated_at: Utc::now(),
        }
    }

    /// Check if the summary has any content
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}
