//! Job lifecycle: one transcription request from acceptance to a terminal state.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{ChatRef, InboundEvent, MediaReference};

/// Randomly generated, collision-free job identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Pipeline states. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Received,
    Downloading,
    ExtractingAudio,
    Transcribing,
    Formatting,
    Replying,
    Done,
    Failed,
}

impl JobStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStage::Done | JobStage::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_advance_to(self, next: JobStage) -> bool {
        use JobStage::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Received, Downloading)
            | (Downloading, ExtractingAudio)
            | (Downloading, Transcribing)
            | (ExtractingAudio, Transcribing)
            | (Transcribing, Formatting)
            | (Formatting, Replying)
            | (Replying, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStage::Received => "received",
            JobStage::Downloading => "downloading",
            JobStage::ExtractingAudio => "extracting_audio",
            JobStage::Transcribing => "transcribing",
            JobStage::Formatting => "formatting",
            JobStage::Replying => "replying",
            JobStage::Done => "done",
            JobStage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Coarse job status derived from the stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid job transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: JobStage,
    pub to: JobStage,
}

/// Lifecycle state of one transcription request.
///
/// Owned exclusively by the task driving it; never shared between jobs.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    chat: ChatRef,
    media: MediaReference,
    stage: JobStage,
    failed_at: Option<JobStage>,
    input_path: Option<PathBuf>,
    audio_path: Option<PathBuf>,
    transcript: Option<String>,
}

impl Job {
    /// Create a pending job for an accepted inbound event.
    pub fn accept(event: &InboundEvent) -> Self {
        Self {
            id: JobId::new(),
            chat: event.chat,
            media: event.media.clone(),
            stage: JobStage::Received,
            failed_at: None,
            input_path: None,
            audio_path: None,
            transcript: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn chat(&self) -> ChatRef {
        self.chat
    }

    pub fn media(&self) -> &MediaReference {
        &self.media
    }

    pub fn stage(&self) -> JobStage {
        self.stage
    }

    /// Stage the job was in when it failed.
    pub fn failed_at(&self) -> Option<JobStage> {
        self.failed_at
    }

    pub fn input_path(&self) -> Option<&Path> {
        self.input_path.as_deref()
    }

    pub fn audio_path(&self) -> Option<&Path> {
        self.audio_path.as_deref()
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn status(&self) -> JobStatus {
        match self.stage {
            JobStage::Done => JobStatus::Succeeded,
            JobStage::Failed => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }

    pub fn advance(&mut self, next: JobStage) -> Result<(), InvalidTransition> {
        if !self.stage.can_advance_to(next) {
            return Err(InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        if next == JobStage::Failed {
            self.failed_at = Some(self.stage);
        }
        self.stage = next;
        Ok(())
    }

    /// Move to `Failed` from any non-terminal stage. No-op once terminal.
    pub fn fail(&mut self) {
        let _ = self.advance(JobStage::Failed);
    }

    pub fn set_input_path(&mut self, path: PathBuf) {
        self.input_path = Some(path);
    }

    pub fn set_audio_path(&mut self, path: PathBuf) {
        self.audio_path = Some(path);
    }

    pub fn set_transcript(&mut self, text: String) {
        self.transcript = Some(text);
    }

    /// Audio file to send for transcription: the extracted track if one
    /// was produced, the downloaded input otherwise.
    pub fn transcription_source(&self) -> Option<&Path> {
        self.audio_path().or_else(|| self.input_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaKind;

    fn event(kind: MediaKind) -> InboundEvent {
        InboundEvent {
            event_id: "1".into(),
            sender_id: Some(42),
            chat: ChatRef { chat_id: 7, message_id: 3 },
            media: MediaReference::new(kind, "file-1", 1024),
        }
    }

    #[test]
    fn voice_job_skips_extraction() {
        let mut job = Job::accept(&event(MediaKind::Voice));
        assert_eq!(job.status(), JobStatus::Pending);
        job.advance(JobStage::Downloading).unwrap();
        job.advance(JobStage::Transcribing).unwrap();
        job.advance(JobStage::Formatting).unwrap();
        job.advance(JobStage::Replying).unwrap();
        job.advance(JobStage::Done).unwrap();
        assert_eq!(job.status(), JobStatus::Succeeded);
    }

    #[test]
    fn cannot_skip_stages() {
        let mut job = Job::accept(&event(MediaKind::Video));
        let err = job.advance(JobStage::Transcribing).unwrap_err();
        assert_eq!(err.from, JobStage::Received);
        assert_eq!(job.stage(), JobStage::Received);
    }

    #[test]
    fn terminal_status_never_reverts() {
        let mut job = Job::accept(&event(MediaKind::VideoNote));
        job.advance(JobStage::Downloading).unwrap();
        job.advance(JobStage::ExtractingAudio).unwrap();
        job.fail();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.failed_at(), Some(JobStage::ExtractingAudio));

        assert!(job.advance(JobStage::Transcribing).is_err());
        job.fail();
        assert_eq!(job.failed_at(), Some(JobStage::ExtractingAudio));
        assert_eq!(job.status(), JobStatus::Failed);
    }

    #[test]
    fn extracted_audio_takes_precedence() {
        let mut job = Job::accept(&event(MediaKind::Video));
        job.set_input_path(PathBuf::from("/tmp/in.mp4"));
        assert_eq!(job.transcription_source(), Some(Path::new("/tmp/in.mp4")));
        job.set_audio_path(PathBuf::from("/tmp/audio.mp3"));
        assert_eq!(job.transcription_source(), Some(Path::new("/tmp/audio.mp3")));
    }

    #[test]
    fn transcript_is_absent_until_recorded() {
        let mut job = Job::accept(&event(MediaKind::Voice));
        assert_eq!(job.transcript(), None);
        job.set_transcript("привет".to_string());
        assert_eq!(job.transcript(), Some("привет"));
    }

    #[test]
    fn job_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| JobId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
