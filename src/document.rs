//! Documents and the inputs they are normalised from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The input modality a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Text,
    Pdf,
    Audio,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provenance::Text => "text",
            Provenance::Pdf => "pdf",
            Provenance::Audio => "audio",
        };
        f.write_str(name)
    }
}

/// Raw request input before normalisation
#[derive(Debug, Clone)]
pub enum Input {
    Text(String),
    Pdf(Vec<u8>),
    Audio { bytes: Vec<u8>, file_name: String },
}

impl Input {
    pub fn provenance(&self) -> Provenance {
        match self {
            Input::Text(_) => Provenance::Text,
            Input::Pdf(_) => Provenance::Pdf,
            Input::Audio { .. } => Provenance::Audio,
        }
    }
}

/// Plain text plus where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub provenance: Provenance,
}

impl Document {
    pub fn new(text: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            text: text.into(),
            provenance,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
