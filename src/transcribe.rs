//! Speech transcription through an OpenAI-compatible audio endpoint (Groq Whisper).

use crate::client::http_client;
use crate::config::{Config, ConfigError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("transcription request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("transcription service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to parse transcription response: {0}")]
    ParseError(String),
}

impl TranscribeError {
    /// The service refused the audio itself rather than failing to serve the request.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            TranscribeError::Status { status, .. }
                if *status == StatusCode::BAD_REQUEST
                    || *status == StatusCode::UNSUPPORTED_MEDIA_TYPE
                    || *status == StatusCode::PAYLOAD_TOO_LARGE
        )
    }
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String, TranscribeError>;
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Groq's `/audio/transcriptions` endpoint
#[derive(Debug, Clone)]
pub struct GroqTranscriber {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl GroqTranscriber {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: http_client().clone(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            timeout,
        }
    }

    /// Fails when no Groq API key is configured
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let key = config.groq_key()?;
        Ok(Self::new(
            config.transcription.endpoint.clone(),
            config.transcription.model.clone(),
            key,
            Duration::from_secs(config.transcription.timeout_secs),
        ))
    }
}

#[async_trait]
impl Transcriber for GroqTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> Result<String, TranscribeError> {
        debug!(bytes = audio.len(), file_name, model = %self.model, "uploading audio");
        let file = Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TranscribeError::Status { status, body });
        }

        let parsed: TranscriptionResponse = serde_json::from_str(&body)
            .map_err(|e| TranscribeError::ParseError(format!("{}: {}", e, body)))?;
        Ok(parsed.text.trim().to_string())
    }
}
