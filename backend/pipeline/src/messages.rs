//! User-facing texts. Failure notices never carry internal error details.

use voxscribe_core::{FailureCategory, MediaKind};

pub const WELCOME: &str = "Перешлите сюда любые кружки, аудио, видео или голосовые сообщения, \
и я пришлю извлечённый из них текст.";

pub const HELP: &str = "Поддерживаются голосовые сообщения, видео-кружки, видео и аудиофайлы \
размером до 20 МБ. Просто отправьте или перешлите сообщение в этот чат.";

pub const UNSUPPORTED: &str =
    "ℹ️ Пожалуйста, отправьте голосовое сообщение, видео-кружок, видео или аудиофайл для расшифровки.";

pub const TOO_LARGE: &str = "❌ Файл слишком большой. Максимальный размер: 20 МБ.";

pub const NO_SPEECH: &str = "🔇 Речь не распознана.";

pub fn processing_notice(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Voice => "⏳ Обрабатываю...",
        MediaKind::VideoNote => "⏳ Обрабатываю кружок...",
        MediaKind::Video => "⏳ Обрабатываю видео...",
        MediaKind::Audio => "⏳ Обрабатываю аудио...",
    }
}

/// Header placed in front of the first transcript segment.
pub fn transcript_header(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Voice => "📝 Расшифровка:",
        MediaKind::VideoNote => "📝 Расшифровка кружка:",
        MediaKind::Video => "📝 Расшифровка видео:",
        MediaKind::Audio => "📝 Расшифровка аудио:",
    }
}

pub fn failure_notice(category: FailureCategory) -> &'static str {
    match category {
        FailureCategory::Download => "❌ Не удалось скачать файл.",
        FailureCategory::Conversion => "❌ Не удалось извлечь звук из видео.",
        FailureCategory::Transcription => "❌ Не удалось расшифровать сообщение.",
        FailureCategory::Internal => "❌ Произошла ошибка при обработке.",
    }
}
