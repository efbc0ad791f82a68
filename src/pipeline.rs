//! The summarisation pipeline: normalise, chunk, summarise each chunk, merge.

use crate::chunker::Chunker;
use crate::config::{Config, ConfigError, MergePolicy, SummarizationConfig};
use crate::document::{Document, Input, Provenance};
use crate::extract::{extract_pdf_text_blocking, ExtractError};
use crate::merge::merge;
use crate::model::{GenerationParams, HuggingFaceModel, ModelError, SummaryModel};
use crate::summary::Summary;
use crate::transcribe::{GroqTranscriber, TranscribeError, Transcriber};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Transcribe(#[from] TranscribeError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Coarse classification surfaced to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed PDF or audio, or nothing could be read from it
    Extraction,
    /// Network, timeout, quota or status failures from a provider
    ExternalService,
    /// Degenerate settings or missing credentials
    Configuration,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Config(_) => ErrorKind::Configuration,
            PipelineError::Extract(_) => ErrorKind::Extraction,
            PipelineError::Transcribe(err) if err.is_rejected_input() => ErrorKind::Extraction,
            PipelineError::Transcribe(_) | PipelineError::Model(_) => ErrorKind::ExternalService,
        }
    }
}

/// Immutable summarisation pipeline.
///
/// Settings are validated on construction; changing them means building a new
/// pipeline with [`Pipeline::with_settings`].
#[derive(Clone)]
pub struct Pipeline {
    settings: SummarizationConfig,
    params: GenerationParams,
    policy: MergePolicy,
    chunker: Chunker,
    model: Arc<dyn SummaryModel>,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl Pipeline {
    pub fn new(
        settings: SummarizationConfig,
        policy: MergePolicy,
        model: Arc<dyn SummaryModel>,
        transcriber: Option<Arc<dyn Transcriber>>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let chunker = Chunker::from_config(&settings)?;
        Ok(Self {
            params: GenerationParams::from(&settings),
            settings,
            policy,
            chunker,
            model,
            transcriber,
        })
    }

    /// Build the pipeline with the configured inference endpoint.
    ///
    /// Audio input is unavailable when no Groq key is configured.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let model: Arc<dyn SummaryModel> = Arc::new(HuggingFaceModel::from_config(config));
        let transcriber: Option<Arc<dyn Transcriber>> = match GroqTranscriber::from_config(config)
        {
            Ok(transcriber) => Some(Arc::new(transcriber)),
            Err(err) => {
                debug!(error = %err, "audio transcription disabled");
                None
            }
        };
        Self::new(
            config.summarization.clone(),
            config.merge,
            model,
            transcriber,
        )
    }

    /// A new pipeline with different settings, sharing this one's clients
    pub fn with_settings(
        &self,
        settings: SummarizationConfig,
        policy: MergePolicy,
    ) -> Result<Self, ConfigError> {
        Self::new(
            settings,
            policy,
            Arc::clone(&self.model),
            self.transcriber.clone(),
        )
    }

    pub fn settings(&self) -> &SummarizationConfig {
        &self.settings
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// Reduce any input to a plain-text document
    pub async fn normalize(&self, input: Input) -> Result<Document, PipelineError> {
        match input {
            Input::Text(text) => Ok(Document::new(text, Provenance::Text)),
            Input::Pdf(bytes) => {
                debug!(bytes = bytes.len(), "extracting PDF");
                let text = extract_pdf_text_blocking(bytes).await?;
                Ok(Document::new(text, Provenance::Pdf))
            }
            Input::Audio { bytes, file_name } => {
                let transcriber = self
                    .transcriber
                    .as_ref()
                    .ok_or_else(|| ConfigError::MissingApiKey("groq".to_string()))?;
                let text = transcriber.transcribe(bytes, &file_name).await?;
                if text.trim().is_empty() {
                    return Err(ExtractError::EmptyTranscript.into());
                }
                Ok(Document::new(text, Provenance::Audio))
            }
        }
    }

    /// Summarise a document. Blank documents produce an empty summary without calling the model.
    pub async fn summarize_document(&self, document: Document) -> Result<Summary, PipelineError> {
        if document.is_blank() {
            info!(provenance = %document.provenance, "document is blank, nothing to summarise");
            return Ok(Summary::empty(
                document.provenance,
                document.text,
                self.settings.model.clone(),
            ));
        }

        let chunks = self.chunker.chunk(&document.text);
        info!(
            provenance = %document.provenance,
            chunks = chunks.len(),
            model = %self.settings.model,
            "summarising document"
        );

        let mut summaries = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            debug!(index = chunk.index, tokens = chunk.token_count(), "summarising chunk");
            summaries.push(self.model.summarize(&chunk.text, &self.params).await?);
        }

        let merged = merge(
            &summaries,
            self.policy,
            self.model.as_ref(),
            &self.params,
            self.chunker.tokenizer(),
        )
        .await?;

        Ok(Summary {
            provenance: document.provenance,
            source_text: document.text,
            text: merged.text,
            chunk_count: chunks.len(),
            resummarized: merged.resummarized,
            model: self.settings.model.clone(),
            generated_at: Utc::now(),
        })
    }

    pub async fn summarize_text(&self, text: impl Into<String>) -> Result<Summary, PipelineError> {
        self.summarize_document(Document::new(text, Provenance::Text))
            .await
    }

    /// Normalise and summarise in one go
    pub async fn run(&self, input: Input) -> Result<Summary, PipelineError> {
        let document = self.normalize(input).await?;
        self.summarize_document(document).await
    }
}
