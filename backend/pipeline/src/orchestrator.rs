//! Drives one job from an accepted event to a terminal state.
//!
//! `Received → Downloading → (ExtractingAudio) → Transcribing → Formatting →
//! Replying → Done`, with `Failed` reachable from every non-terminal stage.
//! Whatever happens, the user gets either the transcript or exactly one
//! failure notice, and the job's scratch directory is released afterwards.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::timeout;
use tracing::{Instrument, debug, error, info, info_span, warn};
use voxscribe_core::{
    AudioExtractor, ChatRef, ExtractionError, ExtractionParams, FailureCategory, Job, JobId,
    JobStage, JobStatus, MediaKind, MediaSource, PipelineError, ReplySink, SentMessage,
    Transcriber, TranscriptionError, TranscriptionErrorKind,
};
use voxscribe_logging::redact_sensitive_data;
use voxscribe_media::{JobScratch, ScratchSpace, input_extension};

use crate::formatter::chunk;
use crate::messages;

/// Telegram refuses text messages longer than this.
pub const MESSAGE_LIMIT: usize = 4096;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub language: String,
    pub extraction: ExtractionParams,
    pub extraction_timeout: Duration,
    pub transcription_timeout: Duration,
    /// Maximum chars per transcript segment.
    pub segment_limit: usize,
    /// Hard transport limit; the header is only added when it fits.
    pub message_limit: usize,
    /// Send a "processing" placeholder that is later edited in place.
    pub show_progress: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            language: "ru".to_string(),
            extraction: ExtractionParams::default(),
            extraction_timeout: Duration::from_secs(120),
            transcription_timeout: Duration::from_secs(120),
            segment_limit: 4000,
            message_limit: MESSAGE_LIMIT,
            show_progress: true,
        }
    }
}

/// What happened to a job, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: JobId,
    pub status: JobStatus,
    pub failed_at: Option<JobStage>,
    pub failure: Option<FailureCategory>,
    pub replies_sent: usize,
}

pub struct Orchestrator {
    source: Arc<dyn MediaSource>,
    sink: Arc<dyn ReplySink>,
    extractor: Arc<dyn AudioExtractor>,
    transcriber: Arc<dyn Transcriber>,
    scratch: ScratchSpace,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn MediaSource>,
        sink: Arc<dyn ReplySink>,
        extractor: Arc<dyn AudioExtractor>,
        transcriber: Arc<dyn Transcriber>,
        scratch: ScratchSpace,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            source,
            sink,
            extractor,
            transcriber,
            scratch,
            settings,
        }
    }

    pub fn sink(&self) -> &Arc<dyn ReplySink> {
        &self.sink
    }

    /// Run `job` to completion. Never returns an error: failures are
    /// reported to the user and summarised in the report.
    pub async fn run(&self, job: Job) -> JobReport {
        let span = info_span!(
            "job",
            job_id = %job.id(),
            kind = %job.media().kind,
            chat = %job.chat(),
        );
        self.run_job(job).instrument(span).await
    }

    async fn run_job(&self, mut job: Job) -> JobReport {
        let kind = job.media().kind;
        info!(declared_size = job.media().declared_size, "Job accepted");

        let mut responder = Responder::new(self.sink.as_ref(), job.chat());
        if self.settings.show_progress {
            responder.open(messages::processing_notice(kind)).await;
        }

        let scratch = match self.acquire(&mut job).await {
            Ok(scratch) => scratch,
            Err(err) => return self.finish_failed(job, &mut responder, err).await,
        };

        let outcome = AssertUnwindSafe(self.drive(&mut job, &scratch))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(PipelineError::Internal(panic_message(panic.as_ref()))));

        let report = match outcome {
            Ok(text) => self.reply_transcript(job, &mut responder, kind, &text).await,
            Err(err) => self.finish_failed(job, &mut responder, err).await,
        };

        scratch.release().await;
        info!(status = ?report.status, replies = report.replies_sent, "Job finished");
        report
    }

    async fn acquire(&self, job: &mut Job) -> Result<JobScratch, PipelineError> {
        advance(job, JobStage::Downloading)?;
        self.scratch.acquire(job.id()).await.map_err(PipelineError::Storage)
    }

    /// Download, extract if needed, transcribe. Returns the raw transcript.
    async fn drive(&self, job: &mut Job, scratch: &JobScratch) -> Result<String, PipelineError> {
        let media = job.media().clone();
        let input = scratch.file(&format!(
            "input.{}",
            input_extension(media.kind, media.mime_type.as_deref())
        ));
        let bytes = self.source.fetch(&media, &input).await?;
        info!(bytes, "Downloaded media");
        job.set_input_path(input.clone());

        if media.kind.needs_extraction() {
            advance(job, JobStage::ExtractingAudio)?;
            let limit = self.settings.extraction_timeout;
            let audio = timeout(
                limit,
                self.extractor
                    .extract(&input, &scratch.file("audio"), &self.settings.extraction),
            )
            .await
            .map_err(|_| ExtractionError::TimedOut(limit))??;
            debug!(extractor = self.extractor.name(), audio = %audio.display(), "Audio extracted");
            job.set_audio_path(audio);
        }

        advance(job, JobStage::Transcribing)?;
        let source = job
            .transcription_source()
            .ok_or_else(|| PipelineError::Internal("no audio to transcribe".to_string()))?
            .to_path_buf();
        let limit = self.settings.transcription_timeout;
        let text = timeout(limit, self.transcriber.transcribe(&source, &self.settings.language))
            .await
            .map_err(|_| {
                TranscriptionError::new(
                    TranscriptionErrorKind::Timeout,
                    format!("no response within {limit:?}"),
                )
            })??;
        debug!(transcriber = self.transcriber.name(), chars = text.chars().count(), "Transcribed");
        job.set_transcript(text.clone());
        Ok(text)
    }

    async fn reply_transcript(
        &self,
        mut job: Job,
        responder: &mut Responder<'_>,
        kind: MediaKind,
        text: &str,
    ) -> JobReport {
        if let Err(err) = advance(&mut job, JobStage::Formatting) {
            return self.finish_failed(job, responder, err).await;
        }
        let replies = compose_replies(
            kind,
            text,
            self.settings.segment_limit,
            self.settings.message_limit,
        );
        if let Err(err) = advance(&mut job, JobStage::Replying) {
            return self.finish_failed(job, responder, err).await;
        }

        let mut sent = 0;
        for reply in &replies {
            if responder.deliver(reply).await {
                sent += 1;
            }
        }
        if sent < replies.len() {
            warn!(sent, total = replies.len(), "Some transcript segments were not delivered");
        }

        if let Err(err) = advance(&mut job, JobStage::Done) {
            error!(error = %err, "Could not mark job done");
        }
        JobReport {
            job_id: job.id(),
            status: job.status(),
            failed_at: None,
            failure: None,
            replies_sent: sent,
        }
    }

    async fn finish_failed(
        &self,
        mut job: Job,
        responder: &mut Responder<'_>,
        err: PipelineError,
    ) -> JobReport {
        let stage = job.stage();
        job.fail();
        let category = err.category();
        error!(
            stage = %stage,
            category = ?category,
            error = %redact_sensitive_data(&err.to_string()),
            "Job failed"
        );
        let sent = usize::from(responder.deliver(messages::failure_notice(category)).await);
        JobReport {
            job_id: job.id(),
            status: job.status(),
            failed_at: job.failed_at(),
            failure: Some(category),
            replies_sent: sent,
        }
    }
}

fn advance(job: &mut Job, next: JobStage) -> Result<(), PipelineError> {
    let from = job.stage();
    job.advance(next)
        .map_err(|e| PipelineError::Internal(e.to_string()))?;
    debug!(from = %from, to = %next, "Stage transition");
    Ok(())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}

/// Final reply texts for a transcript. Blank transcripts become the single
/// "no speech" notice; otherwise the first segment carries the header when
/// it still fits the transport limit.
pub fn compose_replies(
    kind: MediaKind,
    text: &str,
    segment_limit: usize,
    message_limit: usize,
) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return vec![messages::NO_SPEECH.to_string()];
    }

    let header = messages::transcript_header(kind);
    let mut replies: Vec<String> = chunk(text, segment_limit).map(|s| s.text).collect();
    if let Some(first) = replies.first_mut() {
        let with_header = format!("{header}\n\n{first}");
        if with_header.chars().count() <= message_limit {
            *first = with_header;
        }
    }
    replies
}

/// Sends replies for one job, editing the progress placeholder in place
/// for the first one.
struct Responder<'a> {
    sink: &'a dyn ReplySink,
    chat: ChatRef,
    placeholder: Option<SentMessage>,
}

impl<'a> Responder<'a> {
    fn new(sink: &'a dyn ReplySink, chat: ChatRef) -> Self {
        Self {
            sink,
            chat,
            placeholder: None,
        }
    }

    async fn open(&mut self, text: &str) {
        match self.sink.send_text(self.chat, text).await {
            Ok(message) => self.placeholder = Some(message),
            Err(e) => warn!(error = %redact_sensitive_data(&e.to_string()), "Could not send progress placeholder"),
        }
    }

    /// Deliver one user-visible message. Failures are logged, not raised.
    async fn deliver(&mut self, text: &str) -> bool {
        if let Some(message) = self.placeholder.take() {
            match self.sink.edit_text(message, text).await {
                Ok(()) => return true,
                Err(e) => warn!(
                    error = %redact_sensitive_data(&e.to_string()),
                    "Could not edit placeholder; sending a new message"
                ),
            }
        }
        match self.sink.send_text(self.chat, text).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %redact_sensitive_data(&e.to_string()), "Failed to deliver reply");
                false
            }
        }
    }
}
