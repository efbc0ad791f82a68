//! Configuration loading and management for precis.
//!
//! Loads settings from `precis.toml` with environment variable overrides for sensitive data.
//! Every section has defaults, so running without a config file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("failed to serialise config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
    #[error("chunk overlap ({overlap}) must be smaller than max chunk tokens ({max})")]
    OverlapTooLarge { overlap: usize, max: usize },
    #[error("max chunk tokens must be greater than zero")]
    ZeroChunkSize,
    #[error("min summary tokens ({min}) exceeds max summary tokens ({max})")]
    SummaryBounds { min: usize, max: usize },
    #[error("temperature must be positive when sampling, got {0}")]
    InvalidTemperature(f32),
    #[error("model identifier must not be empty")]
    EmptyModel,
}

/// Generation and chunking settings for the summarisation model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummarizationConfig {
    /// Model identifier on the inference endpoint (e.g., "facebook/bart-large-cnn")
    #[serde(alias = "model_name")]
    pub model: String,
    /// Maximum tokens per chunk for long documents
    pub max_chunk_tokens: usize,
    /// Tokens shared between consecutive chunks
    pub chunk_overlap_tokens: usize,
    /// Minimum tokens in a generated summary
    pub min_summary_tokens: usize,
    /// Maximum tokens in a generated summary
    pub max_summary_tokens: usize,
    /// Enable sampling for diverse summaries
    pub do_sample: bool,
    /// Sampling temperature, only sent when `do_sample` is set
    pub temperature: f32,
}

impl SummarizationConfig {
    /// Check the invariants the chunker and model rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if self.max_chunk_tokens == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.chunk_overlap_tokens >= self.max_chunk_tokens {
            return Err(ConfigError::OverlapTooLarge {
                overlap: self.chunk_overlap_tokens,
                max: self.max_chunk_tokens,
            });
        }
        if self.min_summary_tokens > self.max_summary_tokens {
            return Err(ConfigError::SummaryBounds {
                min: self.min_summary_tokens,
                max: self.max_summary_tokens,
            });
        }
        if self.do_sample && (self.temperature.is_nan() || self.temperature <= 0.0) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }
        Ok(())
    }
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            model: "facebook/bart-large-cnn".to_string(),
            max_chunk_tokens: 900,
            chunk_overlap_tokens: 100,
            min_summary_tokens: 64,
            max_summary_tokens: 256,
            do_sample: false,
            temperature: 1.0,
        }
    }
}

/// How per-chunk summaries are combined into the final summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum MergePolicy {
    /// Join the chunk summaries and stop there.
    Concatenate,
    /// Summarise the joined summaries again when there are more than `chunks` of them.
    ResummarizeAboveChunks { chunks: usize },
    /// Summarise the joined summaries again when they exceed `tokens` tokens.
    ResummarizeAboveTokens { tokens: usize },
}

impl Default for MergePolicy {
    fn default() -> Self {
        MergePolicy::ResummarizeAboveChunks { chunks: 3 }
    }
}

/// Summarisation inference endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Base URL; the model identifier is appended as a path
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co/models".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Speech transcription endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1/audio/transcriptions".to_string(),
            model: "whisper-large-v3-turbo".to_string(),
            timeout_secs: 120,
        }
    }
}

/// HTTP API bind address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub huggingface_key: Option<String>,
    #[serde(default)]
    pub groq_key: Option<String>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub summarization: SummarizationConfig,
    #[serde(default)]
    pub merge: MergePolicy,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Load configuration from the default location (precis.toml in cwd or home).
    ///
    /// Falls back to the defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => {
                let mut config = Config::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from TOML text without touching the environment
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Render the configuration as TOML, leaving out API keys
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let mut redacted = self.clone();
        redacted.api = ApiConfig::default();
        Ok(toml::to_string_pretty(&redacted)?)
    }

    /// Override API keys from environment variables
    fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Override API keys from `lookup`, which maps a variable name to its value
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("HF_API_TOKEN") {
            self.api.huggingface_key = Some(key);
        }
        if let Some(key) = lookup("GROQ_API_KEY") {
            self.api.groq_key = Some(key);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from("precis.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config").join("precis").join("precis.toml");
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.summarization.validate()
    }

    /// Get the Groq API key used for transcription
    pub fn groq_key(&self) -> Result<&str, ConfigError> {
        self.api
            .groq_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey("groq".to_string()))
    }
}
