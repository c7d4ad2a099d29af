//! Bot API message JSON for tests.

use serde_json::{Value, json};
use teloxide::types::Message;

pub fn private_chat() -> Value {
    json!({ "id": 55, "type": "private", "first_name": "Ann" })
}

pub fn group_chat() -> Value {
    json!({ "id": -100123, "type": "group", "title": "Team" })
}

/// A message with id 77 in `chat`, with the fields of `body` merged in.
pub fn message(chat: Value, from_bot: bool, body: Value) -> Message {
    let mut raw = json!({
        "message_id": 77,
        "date": 1_700_000_000,
        "chat": chat,
        "from": { "id": 1001, "is_bot": from_bot, "first_name": "Ann" },
    });
    if let (Some(raw), Some(body)) = (raw.as_object_mut(), body.as_object()) {
        for (key, value) in body {
            raw.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(raw).expect("valid Bot API message")
}

pub fn voice_body() -> Value {
    json!({
        "voice": {
            "file_id": "AwACAgIAAxkBAAIV",
            "file_unique_id": "AgADvoice",
            "duration": 10,
            "mime_type": "audio/ogg",
            "file_size": 15_000
        }
    })
}

pub fn video_note_body() -> Value {
    json!({
        "video_note": {
            "file_id": "DQACAgIAAxkBAAIW",
            "file_unique_id": "AgADnote",
            "length": 384,
            "duration": 20,
            "file_size": 1_200_000
        }
    })
}

pub fn video_body() -> Value {
    json!({
        "video": {
            "file_id": "BAACAgIAAxkBAAIX",
            "file_unique_id": "AgADvideo",
            "width": 1280,
            "height": 720,
            "duration": 42,
            "mime_type": "video/mp4",
            "file_size": 8_000_000
        }
    })
}

pub fn audio_body() -> Value {
    json!({
        "audio": {
            "file_id": "CQACAgIAAxkBAAIY",
            "file_unique_id": "AgADaudio",
            "duration": 180,
            "mime_type": "audio/mpeg",
            "file_size": 3_500_000
        }
    })
}

pub fn text_body(text: &str) -> Value {
    json!({ "text": text })
}
