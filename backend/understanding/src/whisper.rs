/// Speech-to-text through the OpenAI-compatible `/audio/transcriptions` endpoint.
///
/// One multipart upload per call. Size and format are checked locally before
/// anything goes over the wire; HTTP failures are mapped onto
/// `TranscriptionErrorKind` so callers can tell an unreachable backend from
/// one that simply heard nothing.
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info};
use voxscribe_core::{Transcriber, TranscriptionError, TranscriptionErrorKind};
use voxscribe_media::{detect_mime_type, is_transcribable};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "whisper-1";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct WhisperClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_upload_bytes: u64,
}

impl WhisperClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    /// Bound every request, connection included, by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, TranscriptionError> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranscriptionError::new(TranscriptionErrorKind::InvalidInput, e.to_string()))?;
        Ok(self)
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url)
    }

    async fn build_form(&self, audio: &Path, language: &str) -> Result<Form, TranscriptionError> {
        let meta = fs::metadata(audio).await.map_err(|e| {
            TranscriptionError::new(TranscriptionErrorKind::InvalidInput, format!("cannot read audio: {e}"))
        })?;
        if meta.len() > self.max_upload_bytes {
            return Err(TranscriptionError::new(
                TranscriptionErrorKind::PayloadTooLarge,
                format!("{} bytes exceeds upload limit of {} bytes", meta.len(), self.max_upload_bytes),
            ));
        }
        if !is_transcribable(audio) {
            return Err(TranscriptionError::new(
                TranscriptionErrorKind::UnsupportedFormat,
                format!("unsupported audio container: {}", audio.display()),
            ));
        }

        let bytes = fs::read(audio).await.map_err(|e| {
            TranscriptionError::new(TranscriptionErrorKind::InvalidInput, format!("cannot read audio: {e}"))
        })?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.mp3".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(detect_mime_type(audio))
            .map_err(|e| TranscriptionError::new(TranscriptionErrorKind::InvalidInput, format!("mime: {e}")))?;

        let mut form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", part);
        if !language.is_empty() {
            form = form.text("language", language.to_string());
        }
        Ok(form)
    }
}

/// Map a non-success HTTP status onto an error category.
pub fn classify_status(status: StatusCode) -> TranscriptionErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TranscriptionErrorKind::Auth,
        StatusCode::TOO_MANY_REQUESTS => TranscriptionErrorKind::RateLimited,
        StatusCode::PAYLOAD_TOO_LARGE => TranscriptionErrorKind::PayloadTooLarge,
        StatusCode::UNSUPPORTED_MEDIA_TYPE => TranscriptionErrorKind::UnsupportedFormat,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => TranscriptionErrorKind::Timeout,
        s if s.is_server_error() => TranscriptionErrorKind::Server,
        _ => TranscriptionErrorKind::InvalidInput,
    }
}

fn request_error(e: reqwest::Error) -> TranscriptionError {
    let kind = if e.is_timeout() {
        TranscriptionErrorKind::Timeout
    } else if e.is_connect() || e.is_request() {
        TranscriptionErrorKind::Unreachable
    } else {
        TranscriptionErrorKind::Server
    };
    // Strip the URL; it may carry query parameters we don't want in logs.
    TranscriptionError::new(kind, e.without_url().to_string())
}

#[async_trait]
impl Transcriber for WhisperClient {
    fn name(&self) -> &str {
        "openai-whisper"
    }

    async fn transcribe(&self, audio: &Path, language: &str) -> Result<String, TranscriptionError> {
        let form = self.build_form(audio, language).await?;
        debug!(model = %self.model, language, audio = %audio.display(), "Sending audio for transcription");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(TranscriptionError::new(
                classify_status(status),
                format!("status {status}: {message}"),
            ));
        }

        let parsed: TranscriptionResponse = response.json().await.map_err(|e| {
            TranscriptionError::new(TranscriptionErrorKind::Server, format!("malformed response: {e}"))
        })?;
        let text = parsed.text.trim().to_string();
        info!(chars = text.chars().count(), "Transcription completed");
        Ok(text)
    }
}
