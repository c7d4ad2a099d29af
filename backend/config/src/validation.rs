//! Config validation with path-addressed messages.

use thiserror::Error;

use crate::defaults::TELEGRAM_MESSAGE_LIMIT;
use crate::schema::VoxscribeConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("'{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Errors block startup; warnings are only logged.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &VoxscribeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_credentials(config, &mut report);
    validate_transcription(config, &mut report);
    validate_extraction(config, &mut report);
    validate_pipeline(config, &mut report);
    report
}

fn validate_credentials(config: &VoxscribeConfig, report: &mut ValidationReport) {
    if config.telegram.bot_token.is_empty() {
        report.error("telegram.botToken", "bot token is required (set TELEGRAM_TOKEN)");
    } else if !config.telegram.bot_token.expose().contains(':') {
        report.warn("telegram.botToken", "does not look like a Telegram bot token");
    }
    if config.transcription.api_key.is_empty() {
        report.error("transcription.apiKey", "API key is required (set OPENAI_API_KEY)");
    }
}

fn validate_transcription(config: &VoxscribeConfig, report: &mut ValidationReport) {
    let t = &config.transcription;
    if !(t.base_url.starts_with("http://") || t.base_url.starts_with("https://")) {
        report.error("transcription.baseUrl", "must be an http(s) URL");
    }
    if t.model.trim().is_empty() {
        report.error("transcription.model", "model cannot be empty");
    }
    if t.timeout_secs == 0 {
        report.error("transcription.timeoutSecs", "timeout must be greater than zero");
    }
    if t.max_upload_bytes == 0 {
        report.error("transcription.maxUploadBytes", "must be greater than zero");
    }
}

fn validate_extraction(config: &VoxscribeConfig, report: &mut ValidationReport) {
    let e = &config.extraction;
    if e.ffmpeg_path.trim().is_empty() {
        report.error("extraction.ffmpegPath", "ffmpeg path cannot be empty");
    }
    if e.timeout_secs == 0 {
        report.error("extraction.timeoutSecs", "timeout must be greater than zero");
    }
    if e.channels == 0 {
        report.error("extraction.channels", "must be at least 1");
    }
    if e.sample_rate != 16_000 {
        report.warn("extraction.sampleRate", "speech models expect 16000 Hz input");
    }
}

fn validate_pipeline(config: &VoxscribeConfig, report: &mut ValidationReport) {
    let limit = config.pipeline.segment_limit;
    if limit == 0 || limit > TELEGRAM_MESSAGE_LIMIT {
        report.error(
            "pipeline.segmentLimit",
            format!("must be between 1 and {TELEGRAM_MESSAGE_LIMIT}"),
        );
    }
    if config.telegram.max_download_bytes == 0 {
        report.error("telegram.maxDownloadBytes", "must be greater than zero");
    }
}
