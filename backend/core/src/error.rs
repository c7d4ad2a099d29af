use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Fetching the inbound media failed.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("media too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("media not reachable: {0}")]
    Unreachable(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to write media to disk: {0}")]
    Io(#[from] std::io::Error),
}

/// Converting media into a transcription-ready audio file failed.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("conversion tool not found: {0}")]
    ToolMissing(String),

    #[error("conversion tool exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("conversion produced no output at {0}")]
    NoOutput(String),

    #[error("conversion timed out after {0:?}")]
    TimedOut(Duration),

    #[error("conversion I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Machine-distinguishable category of a transcription failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionErrorKind {
    InvalidInput,
    Auth,
    RateLimited,
    Server,
    Timeout,
    Unreachable,
    PayloadTooLarge,
    UnsupportedFormat,
}

impl fmt::Display for TranscriptionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidInput => "invalid_input",
            Self::Auth => "auth",
            Self::RateLimited => "rate_limited",
            Self::Server => "server",
            Self::Timeout => "timeout",
            Self::Unreachable => "unreachable",
            Self::PayloadTooLarge => "payload_too_large",
            Self::UnsupportedFormat => "unsupported_format",
        };
        write!(f, "{}", s)
    }
}

/// The speech-to-text backend could not produce a transcript.
///
/// An empty transcript is not an error; callers get `Ok(String::new())`.
#[derive(Debug, Error)]
#[error("transcription failed ({kind}): {message}")]
pub struct TranscriptionError {
    pub kind: TranscriptionErrorKind,
    pub message: String,
}

impl TranscriptionError {
    pub fn new(kind: TranscriptionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Sending or editing a reply failed.
#[derive(Debug, Error)]
#[error("failed to deliver reply to chat {chat_id}: {message}")]
pub struct DeliveryError {
    pub chat_id: i64,
    pub message: String,
}

/// Any failure that ends a job in the `Failed` state.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error("scratch storage error: {0}")]
    Storage(#[source] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Cause category used to pick the user-facing failure notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Download,
    Conversion,
    Transcription,
    Internal,
}

impl PipelineError {
    pub fn category(&self) -> FailureCategory {
        match self {
            PipelineError::Download(_) => FailureCategory::Download,
            PipelineError::Extraction(_) => FailureCategory::Conversion,
            PipelineError::Transcription(_) => FailureCategory::Transcription,
            PipelineError::Storage(_) | PipelineError::Internal(_) => FailureCategory::Internal,
        }
    }
}
