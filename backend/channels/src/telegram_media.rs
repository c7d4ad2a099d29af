//! Telegram Media Handler
//!
//! Recognises transcribable attachments on incoming messages, downloads
//! them through the Bot API, and sends or edits text replies.

use std::path::Path;

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, ReplyParameters};
use teloxide::RequestError;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use voxscribe_core::{
    ChatRef, DeliveryError, DownloadError, InboundEvent, MediaKind, MediaReference, MediaSource,
    ReplySink, SentMessage,
};
use voxscribe_logging::redact_sensitive_data;

/// Build the event for one media attachment.
pub fn media_event(
    kind: MediaKind,
    file_id: impl Into<String>,
    declared_size: u64,
    mime_type: Option<String>,
    chat: ChatRef,
    sender_id: Option<u64>,
) -> InboundEvent {
    let mut media = MediaReference::new(kind, file_id, declared_size);
    if let Some(mime_type) = mime_type {
        media = media.with_mime_type(mime_type);
    }
    InboundEvent {
        event_id: format!("tg-{}-{}", chat.chat_id, chat.message_id),
        sender_id,
        chat,
        media,
    }
}

/// The event for a message carrying a voice message, video note, video, or
/// audio file. `None` for everything else.
pub fn classify(msg: &Message) -> Option<InboundEvent> {
    let (kind, file, mime_type) = if let Some(voice) = msg.voice() {
        (MediaKind::Voice, &voice.file, voice.mime_type.as_ref().map(ToString::to_string))
    } else if let Some(note) = msg.video_note() {
        (MediaKind::VideoNote, &note.file, None)
    } else if let Some(video) = msg.video() {
        (MediaKind::Video, &video.file, video.mime_type.as_ref().map(ToString::to_string))
    } else if let Some(audio) = msg.audio() {
        (MediaKind::Audio, &audio.file, audio.mime_type.as_ref().map(ToString::to_string))
    } else {
        return None;
    };

    let chat = ChatRef {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
    };
    Some(media_event(
        kind,
        file.id.clone(),
        u64::from(file.size),
        mime_type,
        chat,
        msg.from.as_ref().map(|user| user.id.0),
    ))
}

/// Bot API access used by the pipeline: file download and text replies.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
    max_download_bytes: u64,
}

impl TelegramTransport {
    pub fn new(bot: Bot, max_download_bytes: u64) -> Self {
        Self {
            bot,
            max_download_bytes,
        }
    }

    pub fn from_token(token: impl Into<String>, max_download_bytes: u64) -> Self {
        Self::new(Bot::new(token), max_download_bytes)
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

fn lookup_error(err: RequestError) -> DownloadError {
    let message = redact_sensitive_data(&err.to_string());
    match err {
        RequestError::Api(_) => DownloadError::Unreachable(message),
        _ => DownloadError::Transport(message),
    }
}

fn delivery_error(chat_id: i64, err: RequestError) -> DeliveryError {
    DeliveryError {
        chat_id,
        message: redact_sensitive_data(&err.to_string()),
    }
}

#[async_trait]
impl MediaSource for TelegramTransport {
    async fn fetch(&self, media: &MediaReference, dest: &Path) -> Result<u64, DownloadError> {
        let file = self
            .bot
            .get_file(media.handle.clone())
            .await
            .map_err(lookup_error)?;

        let size = u64::from(file.meta.size);
        if size > self.max_download_bytes {
            return Err(DownloadError::TooLarge {
                size,
                limit: self.max_download_bytes,
            });
        }

        let mut out = tokio::fs::File::create(dest).await?;
        self.bot
            .download_file(&file.path, &mut out)
            .await
            .map_err(|e| DownloadError::Transport(redact_sensitive_data(&e.to_string())))?;
        out.flush().await?;

        let written = tokio::fs::metadata(dest).await?.len();
        debug!(handle = %media.handle, written, "Telegram file downloaded");
        Ok(written)
    }
}

#[async_trait]
impl ReplySink for TelegramTransport {
    async fn send_text(&self, chat: ChatRef, text: &str) -> Result<SentMessage, DeliveryError> {
        let sent = self
            .bot
            .send_message(ChatId(chat.chat_id), text)
            .reply_parameters(ReplyParameters::new(MessageId(chat.message_id)))
            .await
            .map_err(|e| delivery_error(chat.chat_id, e))?;
        Ok(SentMessage {
            chat_id: sent.chat.id.0,
            message_id: sent.id.0,
        })
    }

    async fn edit_text(&self, message: SentMessage, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .edit_message_text(ChatId(message.chat_id), MessageId(message.message_id), text)
            .await
            .map_err(|e| delivery_error(message.chat_id, e))?;
        Ok(())
    }
}
