//! External summarisation model.
//!
//! [`SummaryModel`] is the seam between the pipeline and whatever serves the
//! model; [`HuggingFaceModel`] talks to a Hugging Face style inference endpoint.

use crate::client::http_client;
use crate::config::{Config, SummarizationConfig};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to parse model response: {0}")]
    ParseError(String),
    #[error("model returned no summary")]
    EmptyResponse,
}

/// Per-call generation settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub model: String,
    pub min_length: usize,
    pub max_length: usize,
    pub do_sample: bool,
    pub temperature: f32,
}

impl From<&SummarizationConfig> for GenerationParams {
    fn from(config: &SummarizationConfig) -> Self {
        Self {
            model: config.model.clone(),
            min_length: config.min_summary_tokens,
            max_length: config.max_summary_tokens,
            do_sample: config.do_sample,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
pub trait SummaryModel: Send + Sync {
    /// Summarise `input`. Errors are returned as produced by the backend.
    async fn summarize(&self, input: &str, params: &GenerationParams) -> Result<String, ModelError>;
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceParameters {
    min_length: usize,
    max_length: usize,
    do_sample: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    truncation: bool,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Deserialize)]
struct InferenceOutput {
    summary_text: String,
}

/// Client for `POST {endpoint}/{model}` summarisation inference.
#[derive(Debug, Clone)]
pub struct HuggingFaceModel {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HuggingFaceModel {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: http_client().clone(),
            endpoint: endpoint.into(),
            api_key,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.inference.endpoint.clone(),
            config.api.huggingface_key.clone(),
            Duration::from_secs(config.inference.timeout_secs),
        )
    }

    fn url(&self, model: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), model)
    }
}

#[async_trait]
impl SummaryModel for HuggingFaceModel {
    async fn summarize(&self, input: &str, params: &GenerationParams) -> Result<String, ModelError> {
        let body = InferenceRequest {
            inputs: input,
            parameters: InferenceParameters {
                min_length: params.min_length,
                max_length: params.max_length,
                do_sample: params.do_sample,
                // Only meaningful when sampling
                temperature: params.do_sample.then_some(params.temperature),
                truncation: true,
            },
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let mut request = self
            .client
            .post(self.url(&params.model))
            .timeout(self.timeout)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(model = %params.model, bytes = input.len(), "requesting summary");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ModelError::Status { status, body: text });
        }

        let outputs: Vec<InferenceOutput> = serde_json::from_str(&text)
            .map_err(|e| ModelError::ParseError(format!("{}: {}", e, text)))?;
        outputs
            .into_iter()
            .next()
            .map(|output| output.summary_text.trim().to_string())
            .ok_or(ModelError::EmptyResponse)
    }
}
