//! `voxscribe run`: wire the pipeline together and serve Telegram updates
//! until Ctrl-C, then drain in-flight jobs.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use voxscribe_channels::{ChannelAdapter, TelegramAdapter, TelegramTransport};
use voxscribe_config::VoxscribeConfig;
use voxscribe_core::ExtractionParams;
use voxscribe_media::{FfmpegExtractor, ScratchSpace};
use voxscribe_pipeline::{EventDispatcher, Orchestrator, PipelineSettings};
use voxscribe_understanding::WhisperClient;

pub fn pipeline_settings(config: &VoxscribeConfig) -> PipelineSettings {
    PipelineSettings {
        language: config.transcription.language.clone(),
        extraction: ExtractionParams {
            sample_rate: config.extraction.sample_rate,
            channels: config.extraction.channels,
            bitrate: config.extraction.bitrate.clone(),
        },
        extraction_timeout: config.extraction.timeout(),
        transcription_timeout: config.transcription.timeout(),
        segment_limit: config.pipeline.segment_limit,
        ..PipelineSettings::default()
    }
}

pub async fn run(config: VoxscribeConfig) -> Result<()> {
    info!(
        model = %config.transcription.model,
        language = %config.transcription.language,
        scratch = %config.pipeline.scratch_dir.display(),
        "Starting voxscribe"
    );

    let scratch = ScratchSpace::new(&config.pipeline.scratch_dir);
    match scratch.purge_leftovers().await {
        Ok(0) => {}
        Ok(removed) => warn!(removed, "Removed scratch directories left by a previous run"),
        Err(e) => warn!(error = %e, "Could not clean scratch root"),
    }

    let extractor = FfmpegExtractor::new(&config.extraction.ffmpeg_path);
    match extractor.probe().await {
        Ok(version) => info!(%version, "ffmpeg available"),
        Err(e) => warn!(error = %e, "ffmpeg is not usable; videos and video notes will fail"),
    }

    let transcriber = WhisperClient::new(config.transcription.api_key.expose())
        .with_base_url(&config.transcription.base_url)
        .with_model(&config.transcription.model)
        .with_max_upload_bytes(config.transcription.max_upload_bytes)
        .with_timeout(config.transcription.timeout())
        .context("building transcription client")?;

    let transport = Arc::new(TelegramTransport::from_token(
        config.telegram.bot_token.expose(),
        config.telegram.max_download_bytes,
    ));

    let orchestrator = Arc::new(Orchestrator::new(
        transport.clone(),
        transport.clone(),
        Arc::new(extractor),
        Arc::new(transcriber),
        scratch,
        pipeline_settings(&config),
    ));
    let dispatcher = Arc::new(EventDispatcher::new(
        orchestrator,
        config.telegram.max_download_bytes,
    ));

    let adapter = TelegramAdapter::new(transport.bot().clone());
    let served = adapter.start(dispatcher.clone()).await;
    if let Err(e) = &served {
        warn!(adapter = adapter.name(), error = %e, "Adapter stopped with an error");
    }

    let summary = dispatcher.shutdown(config.pipeline.shutdown_grace()).await;
    info!(
        completed = summary.completed,
        aborted = summary.aborted,
        "Shutdown complete"
    );
    served
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let mut config = VoxscribeConfig::default();
        config.transcription.language = "en".into();
        config.extraction.sample_rate = 22_050;
        config.extraction.bitrate = "96k".into();
        config.pipeline.segment_limit = 3500;

        let settings = pipeline_settings(&config);
        assert_eq!(settings.language, "en");
        assert_eq!(settings.extraction.sample_rate, 22_050);
        assert_eq!(settings.extraction.channels, 1);
        assert_eq!(settings.extraction.bitrate, "96k");
        assert_eq!(settings.segment_limit, 3500);
        assert_eq!(settings.message_limit, voxscribe_pipeline::MESSAGE_LIMIT);
        assert!(settings.show_progress);
    }
}
