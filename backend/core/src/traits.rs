use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{DeliveryError, DownloadError, ExtractionError, TranscriptionError};
use crate::types::{ChatRef, ExtractionParams, MediaReference, SentMessage};

/// Fetches inbound media bytes from the chat transport.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Download the referenced media into `dest`, returning the number of bytes written.
    async fn fetch(&self, media: &MediaReference, dest: &Path) -> Result<u64, DownloadError>;
}

/// Sends text replies back to the originating conversation.
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Send a new message replying to `chat.message_id`.
    async fn send_text(&self, chat: ChatRef, text: &str) -> Result<SentMessage, DeliveryError>;

    /// Replace the text of a message previously sent by the bot.
    async fn edit_text(&self, message: SentMessage, text: &str) -> Result<(), DeliveryError>;
}

/// Produces a transcription-ready audio file from arbitrary input media.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Human-readable extractor name for logging.
    fn name(&self) -> &str;

    /// Convert `input` into an audio file, written at (or next to) `output_hint`.
    /// Returns the path of the produced file.
    async fn extract(
        &self,
        input: &Path,
        output_hint: &Path,
        params: &ExtractionParams,
    ) -> Result<PathBuf, ExtractionError>;
}

/// Speech-to-text backend. One request per call, no retries.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Backend name (e.g., "openai-whisper").
    fn name(&self) -> &str;

    /// Transcribe the audio file at `audio`. An empty string means the
    /// backend found no speech.
    async fn transcribe(&self, audio: &Path, language: &str) -> Result<String, TranscriptionError>;
}
