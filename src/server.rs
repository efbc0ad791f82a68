//! JSON HTTP API over the pipeline.

use crate::config::{ConfigError, ServerConfig, SummarizationConfig};
use crate::document::Input;
use crate::pipeline::{ErrorKind, Pipeline, PipelineError};
use crate::summary::Summary;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, RwLock};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<RwLock<Arc<Pipeline>>>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(RwLock::new(Arc::new(pipeline))),
        }
    }

    /// Snapshot of the pipeline serving new requests
    pub fn current(&self) -> Arc<Pipeline> {
        let guard = self.pipeline.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    fn replace(&self, pipeline: Pipeline) {
        let mut guard = self.pipeline.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(pipeline);
    }
}

/// Error body: `{"error": message}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match (&err, err.kind()) {
            (PipelineError::Config(ConfigError::MissingApiKey(_)), _) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            (_, ErrorKind::Configuration) => StatusCode::BAD_REQUEST,
            (_, ErrorKind::Extraction) => StatusCode::UNPROCESSABLE_ENTITY,
            (_, ErrorKind::ExternalService) => StatusCode::BAD_GATEWAY,
        };
        warn!(%status, error = %err, "request failed");
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        PipelineError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // 422 is reserved for unreadable documents
        let status = match &rejection {
            JsonRejection::JsonDataError(_) => StatusCode::BAD_REQUEST,
            other => other.status(),
        };
        Self {
            status,
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
    pub chunks: usize,
    pub resummarized: bool,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcribed_text: Option<String>,
}

impl From<&Summary> for SummaryResponse {
    fn from(summary: &Summary) -> Self {
        Self {
            summary: summary.text.clone(),
            chunks: summary.chunk_count,
            resummarized: summary.resummarized,
            model: summary.model.clone(),
            extracted_text: None,
            transcribed_text: None,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/summarize/text", post(summarize_text))
        .route("/api/summarize/pdf", post(summarize_pdf))
        .route("/api/summarize/audio", post(summarize_audio))
        .route("/api/config", get(get_config).post(update_config))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState, server: &ServerConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind((server.host.as_str(), server.port)).await?;
    info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, create_router(state))
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn summarize_text(
    State(state): State<AppState>,
    request: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let Json(request) = request?;
    if request.text.trim().is_empty() {
        return Err(ApiError::bad_request("No text provided"));
    }
    let summary = state.current().summarize_text(request.text).await?;
    Ok(Json(SummaryResponse::from(&summary)))
}

async fn summarize_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let (_, bytes) = read_file_field(multipart?).await?;
    let summary = state.current().run(Input::Pdf(bytes)).await?;
    let mut response = SummaryResponse::from(&summary);
    response.extracted_text = Some(summary.source_text);
    Ok(Json(response))
}

async fn summarize_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let (file_name, bytes) = read_file_field(multipart?).await?;
    let summary = state
        .current()
        .run(Input::Audio { bytes, file_name })
        .await?;
    let mut response = SummaryResponse::from(&summary);
    response.transcribed_text = Some(summary.source_text);
    Ok(Json(response))
}

async fn get_config(State(state): State<AppState>) -> Json<SummarizationConfig> {
    Json(state.current().settings().clone())
}

async fn update_config(
    State(state): State<AppState>,
    settings: Result<Json<SummarizationConfig>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(settings) = settings?;
    let current = state.current();
    let updated = current.with_settings(settings, current.policy())?;
    info!(settings = ?updated.settings(), "configuration updated");
    state.replace(updated);
    Ok(Json(
        json!({ "message": "Configuration updated successfully" }),
    ))
}

/// The `file` field of a multipart upload as (file name, bytes)
async fn read_file_field(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(ApiError::bad_request("No file selected"));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        return Ok((file_name, bytes.to_vec()));
    }
    Err(ApiError::bad_request("No file provided"))
}
