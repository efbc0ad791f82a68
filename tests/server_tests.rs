use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use precis::model::{GenerationParams, ModelError, SummaryModel};
use precis::server::{create_router, AppState};
use precis::transcribe::{TranscribeError, Transcriber};
use precis::{MergePolicy, Pipeline, SummarizationConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct UppercaseModel;

#[async_trait]
impl SummaryModel for UppercaseModel {
    async fn summarize(&self, input: &str, _: &GenerationParams) -> Result<String, ModelError> {
        Ok(input.to_uppercase())
    }
}

struct EchoTranscriber;

#[async_trait]
impl Transcriber for EchoTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, _: &str) -> Result<String, TranscribeError> {
        Ok(String::from_utf8_lossy(&audio).into_owned())
    }
}

fn state(transcriber: Option<Arc<dyn Transcriber>>) -> AppState {
    let pipeline = Pipeline::new(
        SummarizationConfig::default(),
        MergePolicy::default(),
        Arc::new(UppercaseModel),
        transcriber,
    )
    .unwrap();
    AppState::new(pipeline)
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let boundary = "precis-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(state(None), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn summarises_posted_text() {
    let request = json_request("POST", "/api/summarize/text", json!({ "text": "hello there" }));
    let (status, body) = send(state(None), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "HELLO THERE");
    assert_eq!(body["chunks"], 1);
    assert_eq!(body["resummarized"], false);
    assert!(body.get("extracted_text").is_none());
}

#[tokio::test]
async fn blank_text_is_rejected() {
    let request = json_request("POST", "/api/summarize/text", json!({ "text": "   " }));
    let (status, body) = send(state(None), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No text provided");
}

#[tokio::test]
async fn audio_returns_transcript_and_summary() {
    let transcriber: Arc<dyn Transcriber> = Arc::new(EchoTranscriber);
    let request = multipart_request("/api/summarize/audio", "memo.ogg", b"spoken words");
    let (status, body) = send(state(Some(transcriber)), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcribed_text"], "spoken words");
    assert_eq!(body["summary"], "SPOKEN WORDS");
}

#[tokio::test]
async fn audio_without_key_is_unavailable() {
    let request = multipart_request("/api/summarize/audio", "memo.ogg", b"spoken words");
    let (status, body) = send(state(None), request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("groq"));
}

#[tokio::test]
async fn malformed_pdf_is_unprocessable() {
    let request = multipart_request("/api/summarize/pdf", "report.pdf", b"not a pdf");
    let (status, body) = send(state(None), request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn upload_without_file_name_is_rejected() {
    let request = multipart_request("/api/summarize/pdf", "", b"%PDF");
    let (status, body) = send(state(None), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file selected");
}

#[tokio::test]
async fn config_can_be_read_and_replaced() {
    let state = state(None);

    let request = Request::builder().uri("/api/config").body(Body::empty()).unwrap();
    let (status, body) = send(state.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["max_chunk_tokens"], 900);

    let mut updated = body.clone();
    updated["max_chunk_tokens"] = json!(512);
    updated["chunk_overlap_tokens"] = json!(64);
    let (status, body) = send(state.clone(), json_request("POST", "/api/config", updated)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Configuration updated successfully");
    assert_eq!(state.current().settings().max_chunk_tokens, 512);
}

#[tokio::test]
async fn degenerate_config_is_rejected_and_not_applied() {
    let state = state(None);
    let request = json_request(
        "POST",
        "/api/config",
        json!({ "max_chunk_tokens": 100, "chunk_overlap_tokens": 100 }),
    );
    let (status, body) = send(state.clone(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("overlap"));
    assert_eq!(state.current().settings().max_chunk_tokens, 900);
}

#[tokio::test]
async fn malformed_json_gets_a_json_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/summarize/text")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(state(None), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn wrong_content_type_gets_a_json_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/summarize/text")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("hello there"))
        .unwrap();
    let (status, body) = send(state(None), request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn upload_that_is_not_multipart_gets_a_json_error() {
    let request = json_request("POST", "/api/summarize/pdf", json!({ "file": "report.pdf" }));
    let (status, body) = send(state(None), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn config_accepts_model_name() {
    let state = state(None);
    let request = json_request(
        "POST",
        "/api/config",
        json!({ "model_name": "google/pegasus-xsum", "max_chunk_tokens": 600 }),
    );
    let (status, _) = send(state.clone(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.current().settings().model, "google/pegasus-xsum");
    assert_eq!(state.current().settings().max_chunk_tokens, 600);
}

#[tokio::test]
async fn misspelled_config_field_is_rejected() {
    let state = state(None);
    let request = json_request("POST", "/api/config", json!({ "max_chunk_token": 512 }));
    let (status, body) = send(state.clone(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("max_chunk_token"));
    assert_eq!(state.current().settings().max_chunk_tokens, 900);
}
