use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of media attached to an inbound message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Push-to-talk voice message (OGG/Opus).
    Voice,
    /// Round looping video message.
    VideoNote,
    /// Regular video attachment.
    Video,
    /// Audio file attachment (mp3, m4a, ogg, wav, ...).
    Audio,
}

impl MediaKind {
    /// Whether the audio track has to be extracted before transcription.
    pub fn needs_extraction(self) -> bool {
        matches!(self, MediaKind::VideoNote | MediaKind::Video)
    }

    /// File extension used for the downloaded input when the transport
    /// does not tell us anything better.
    pub fn default_extension(self) -> &'static str {
        match self {
            MediaKind::Voice => "ogg",
            MediaKind::VideoNote | MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Voice => write!(f, "voice"),
            MediaKind::VideoNote => write!(f, "video_note"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// The inbound file as known to the chat transport. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaReference {
    /// Opaque transport handle (Telegram `file_id`).
    pub handle: String,
    /// Size declared by the transport, in bytes. Zero when unknown.
    pub declared_size: u64,
    pub kind: MediaKind,
    /// MIME type declared by the sender, if any.
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl MediaReference {
    pub fn new(kind: MediaKind, handle: impl Into<String>, declared_size: u64) -> Self {
        Self {
            handle: handle.into(),
            declared_size,
            kind,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Where replies for a job go: the originating chat and the message being answered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChatRef {
    pub chat_id: i64,
    pub message_id: i32,
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chat_id, self.message_id)
    }
}

/// Identifier of a message sent by the bot, used to edit it later.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i32,
}

/// One user action delivered by the chat transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundEvent {
    pub event_id: String,
    pub sender_id: Option<u64>,
    pub chat: ChatRef,
    pub media: MediaReference,
}

/// Target audio format for the extraction step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractionParams {
    pub sample_rate: u32,
    pub channels: u8,
    /// Bitrate in ffmpeg notation, e.g. `64k`.
    pub bitrate: String,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            bitrate: "64k".to_string(),
        }
    }
}
