//! Default values for every tunable setting.

/// Telegram Bot API refuses `getFile` downloads above 20 MiB.
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Upload ceiling of the OpenAI transcription endpoint.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "whisper-1";
pub const DEFAULT_LANGUAGE: &str = "ru";
pub const DEFAULT_TRANSCRIPTION_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
pub const DEFAULT_CHANNELS: u8 = 1;
pub const DEFAULT_BITRATE: &str = "64k";
pub const DEFAULT_EXTRACTION_TIMEOUT_SECS: u64 = 120;

/// Hard Telegram limit on the length of one text message.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Default segment size; leaves room for the transcript header.
pub const DEFAULT_SEGMENT_LIMIT: usize = 4000;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 30;
pub const DEFAULT_SCRATCH_SUBDIR: &str = "voxscribe";

pub const DEFAULT_LOG_LEVEL: &str = "info";
