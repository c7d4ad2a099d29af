//! In-memory stand-ins for the transport, extractor, and transcriber.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use voxscribe_core::{
    AudioExtractor, ChatRef, DeliveryError, DownloadError, ExtractionError, ExtractionParams,
    InboundEvent, MediaKind, MediaReference, MediaSource, ReplySink, SentMessage, Transcriber,
    TranscriptionError, TranscriptionErrorKind,
};

pub fn event(kind: MediaKind, declared_size: u64) -> InboundEvent {
    InboundEvent {
        event_id: "evt-1".into(),
        sender_id: Some(1001),
        chat: ChatRef { chat_id: 55, message_id: 9 },
        media: MediaReference::new(kind, "file-abc", declared_size),
    }
}

#[derive(Default)]
pub struct FakeSource {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl MediaSource for FakeSource {
    async fn fetch(&self, _media: &MediaReference, dest: &Path) -> Result<u64, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DownloadError::Transport("connection reset".into()));
        }
        tokio::fs::write(dest, b"media-bytes").await?;
        Ok(11)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOp {
    Sent { id: i32, text: String },
    Edited { id: i32, text: String },
}

#[derive(Default)]
pub struct RecordingSink {
    pub ops: Mutex<Vec<SinkOp>>,
    pub fail_sends: bool,
    pub fail_edits: bool,
    /// 1-based number of the single send that fails, if any.
    pub fail_send_number: Option<usize>,
    pub next_id: AtomicI32,
    pub send_attempts: AtomicUsize,
}

impl RecordingSink {
    pub fn failing_sends() -> Self {
        Self { fail_sends: true, ..Default::default() }
    }

    pub fn failing_edits() -> Self {
        Self { fail_edits: true, ..Default::default() }
    }

    pub fn failing_send_number(n: usize) -> Self {
        Self { fail_send_number: Some(n), ..Default::default() }
    }

    pub fn ops(&self) -> Vec<SinkOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Final text of every message the user can see, in send order.
    pub fn visible(&self) -> Vec<String> {
        let mut messages: Vec<(i32, String)> = Vec::new();
        for op in self.ops() {
            match op {
                SinkOp::Sent { id, text } => messages.push((id, text)),
                SinkOp::Edited { id, text } => {
                    if let Some(m) = messages.iter_mut().find(|(mid, _)| *mid == id) {
                        m.1 = text;
                    }
                }
            }
        }
        messages.into_iter().map(|(_, t)| t).collect()
    }
}

#[async_trait]
impl ReplySink for RecordingSink {
    async fn send_text(&self, chat: ChatRef, text: &str) -> Result<SentMessage, DeliveryError> {
        let attempt = self.send_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_sends || self.fail_send_number == Some(attempt) {
            return Err(DeliveryError { chat_id: chat.chat_id, message: "blocked".into() });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 100;
        self.ops.lock().unwrap().push(SinkOp::Sent { id, text: text.to_string() });
        Ok(SentMessage { chat_id: chat.chat_id, message_id: id })
    }

    async fn edit_text(&self, message: SentMessage, text: &str) -> Result<(), DeliveryError> {
        if self.fail_edits {
            return Err(DeliveryError { chat_id: message.chat_id, message: "edit refused".into() });
        }
        self.ops.lock().unwrap().push(SinkOp::Edited { id: message.message_id, text: text.to_string() });
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ExtractCall {
    pub input: PathBuf,
    pub input_existed: bool,
    pub output_hint: PathBuf,
    pub params: ExtractionParams,
}

#[derive(Default)]
pub struct FakeExtractor {
    pub fail: bool,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<ExtractCall>>,
}

#[async_trait]
impl AudioExtractor for FakeExtractor {
    fn name(&self) -> &str {
        "fake"
    }

    async fn extract(
        &self,
        input: &Path,
        output_hint: &Path,
        params: &ExtractionParams,
    ) -> Result<PathBuf, ExtractionError> {
        self.calls.lock().unwrap().push(ExtractCall {
            input: input.to_path_buf(),
            input_existed: input.exists(),
            output_hint: output_hint.to_path_buf(),
            params: params.clone(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(ExtractionError::Failed { code: Some(1), stderr: "moov atom not found".into() });
        }
        let output = output_hint.with_extension("mp3");
        tokio::fs::write(&output, b"ID3audio").await?;
        Ok(output)
    }
}

pub enum TranscriberBehaviour {
    Text(String),
    Fail(TranscriptionErrorKind),
    Panic,
    Hang,
}

pub struct FakeTranscriber {
    pub behaviour: TranscriberBehaviour,
    pub calls: Mutex<Vec<(PathBuf, bool, String)>>,
}

impl FakeTranscriber {
    pub fn text(text: impl Into<String>) -> Self {
        Self::with(TranscriberBehaviour::Text(text.into()))
    }

    pub fn with(behaviour: TranscriberBehaviour) -> Self {
        Self { behaviour, calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<(PathBuf, bool, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    fn name(&self) -> &str {
        "fake"
    }

    async fn transcribe(&self, audio: &Path, language: &str) -> Result<String, TranscriptionError> {
        self.calls
            .lock()
            .unwrap()
            .push((audio.to_path_buf(), audio.exists(), language.to_string()));
        match &self.behaviour {
            TranscriberBehaviour::Text(t) => Ok(t.clone()),
            TranscriberBehaviour::Fail(kind) => Err(TranscriptionError::new(*kind, "backend said no")),
            TranscriberBehaviour::Panic => panic!("transcriber exploded"),
            TranscriberBehaviour::Hang => std::future::pending().await,
        }
    }
}
