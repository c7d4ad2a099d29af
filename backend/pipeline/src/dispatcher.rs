//! Turns inbound events into independently running jobs.
//!
//! Oversized media is rejected up front, before any job or scratch
//! directory exists. Accepted jobs run concurrently on the tokio runtime;
//! one job's failure never touches another.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{error, info, warn};
use voxscribe_core::{InboundEvent, Job, JobId};

use crate::messages;
use crate::orchestrator::{JobReport, Orchestrator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    TooLarge { declared: u64, limit: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Accepted(JobId),
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownSummary {
    pub completed: usize,
    pub aborted: usize,
}

pub struct EventDispatcher {
    orchestrator: Arc<Orchestrator>,
    max_download_bytes: u64,
    jobs: Mutex<JoinSet<JobReport>>,
}

impl EventDispatcher {
    pub fn new(orchestrator: Arc<Orchestrator>, max_download_bytes: u64) -> Self {
        Self {
            orchestrator,
            max_download_bytes,
            jobs: Mutex::new(JoinSet::new()),
        }
    }

    /// Accept `event` as a new job, or reject it with a user-facing notice.
    /// Returns as soon as the job is scheduled.
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchOutcome {
        let declared = event.media.declared_size;
        if declared > self.max_download_bytes {
            warn!(
                event_id = %event.event_id,
                chat = %event.chat,
                declared,
                limit = self.max_download_bytes,
                "Rejecting oversized media"
            );
            if let Err(e) = self
                .orchestrator
                .sink()
                .send_text(event.chat, messages::TOO_LARGE)
                .await
            {
                warn!(error = %e, "Could not send size rejection");
            }
            return DispatchOutcome::Rejected(RejectReason::TooLarge {
                declared,
                limit: self.max_download_bytes,
            });
        }

        let job = Job::accept(&event);
        let id = job.id();
        info!(event_id = %event.event_id, job_id = %id, "Dispatching job");

        let orchestrator = self.orchestrator.clone();
        let mut jobs = self.lock_jobs();
        reap(&mut jobs);
        jobs.spawn(async move { orchestrator.run(job).await });
        DispatchOutcome::Accepted(id)
    }

    /// Jobs spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        let mut jobs = self.lock_jobs();
        reap(&mut jobs);
        jobs.len()
    }

    /// Wait up to `grace` for running jobs, then abort the rest. Aborted
    /// jobs still drop their scratch directories.
    pub async fn shutdown(&self, grace: Duration) -> ShutdownSummary {
        let mut jobs = std::mem::take(&mut *self.lock_jobs());
        let mut summary = ShutdownSummary::default();
        info!(in_flight = jobs.len(), grace_secs = grace.as_secs(), "Draining jobs");

        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = jobs.join_next().await {
                log_join(joined);
                summary.completed += 1;
            }
        })
        .await;

        if drained.is_err() {
            summary.aborted = jobs.len();
            warn!(aborted = summary.aborted, "Grace period elapsed; aborting jobs");
            jobs.abort_all();
            while jobs.join_next().await.is_some() {}
        }
        summary
    }

    fn lock_jobs(&self) -> std::sync::MutexGuard<'_, JoinSet<JobReport>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn reap(jobs: &mut JoinSet<JobReport>) {
    while let Some(joined) = jobs.try_join_next() {
        log_join(joined);
    }
}

fn log_join(joined: Result<JobReport, tokio::task::JoinError>) {
    match joined {
        Ok(report) => info!(job_id = %report.job_id, status = ?report.status, "Job reaped"),
        Err(e) if e.is_cancelled() => {}
        Err(e) => error!(error = %e, "Job task ended abnormally"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::PipelineSettings;
    use crate::testing::*;
    use std::sync::atomic::Ordering;
    use voxscribe_core::MediaKind;
    use voxscribe_media::ScratchSpace;

    const LIMIT: u64 = 20 * 1024 * 1024;

    struct Fixture {
        source: Arc<FakeSource>,
        sink: Arc<RecordingSink>,
        extractor: Arc<FakeExtractor>,
        transcriber: Arc<FakeTranscriber>,
        root: tempfile::TempDir,
        dispatcher: EventDispatcher,
    }

    impl Fixture {
        fn scratch_is_empty(&self) -> bool {
            match std::fs::read_dir(self.root.path()) {
                Ok(mut entries) => entries.next().is_none(),
                Err(_) => true,
            }
        }
    }

    fn fixture(extractor: FakeExtractor, transcriber: FakeTranscriber) -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let source = Arc::new(FakeSource::default());
        let sink = Arc::new(RecordingSink::default());
        let extractor = Arc::new(extractor);
        let transcriber = Arc::new(transcriber);
        let orchestrator = Orchestrator::new(
            source.clone(),
            sink.clone(),
            extractor.clone(),
            transcriber.clone(),
            ScratchSpace::new(root.path()),
            PipelineSettings::default(),
        );
        let dispatcher = EventDispatcher::new(Arc::new(orchestrator), LIMIT);
        Fixture { source, sink, extractor, transcriber, root, dispatcher }
    }

    #[tokio::test]
    async fn oversized_media_is_rejected_before_any_work() {
        let f = fixture(FakeExtractor::default(), FakeTranscriber::text("unused"));
        let outcome = f.dispatcher.dispatch(event(MediaKind::Video, 50 * 1024 * 1024)).await;

        assert_eq!(
            outcome,
            DispatchOutcome::Rejected(RejectReason::TooLarge {
                declared: 50 * 1024 * 1024,
                limit: LIMIT
            })
        );
        assert_eq!(f.dispatcher.in_flight(), 0);
        assert_eq!(f.source.calls.load(Ordering::SeqCst), 0);
        assert!(f.extractor.calls.lock().unwrap().is_empty());
        assert!(f.transcriber.calls().is_empty());
        assert_eq!(f.sink.visible(), vec![messages::TOO_LARGE.to_string()]);
        assert!(f.scratch_is_empty());
    }

    #[tokio::test]
    async fn size_exactly_at_limit_is_accepted() {
        let f = fixture(FakeExtractor::default(), FakeTranscriber::text("ok"));
        let outcome = f.dispatcher.dispatch(event(MediaKind::Voice, LIMIT)).await;
        assert!(matches!(outcome, DispatchOutcome::Accepted(_)));

        let summary = f.dispatcher.shutdown(Duration::from_secs(5)).await;
        assert_eq!(summary, ShutdownSummary { completed: 1, aborted: 0 });
        assert!(f.scratch_is_empty());
    }

    #[tokio::test]
    async fn jobs_run_concurrently_and_independently() {
        let f = fixture(
            FakeExtractor { delay: Some(Duration::from_millis(200)), ..Default::default() },
            FakeTranscriber::text("ok"),
        );
        let mut ids = Vec::new();
        for _ in 0..10 {
            match f.dispatcher.dispatch(event(MediaKind::VideoNote, 1024)).await {
                DispatchOutcome::Accepted(id) => ids.push(id),
                other => panic!("unexpected {other:?}"),
            }
        }
        ids.sort_by_key(|id| id.as_uuid());
        ids.dedup();
        assert_eq!(ids.len(), 10);
        assert!(f.dispatcher.in_flight() > 0);

        let summary = f.dispatcher.shutdown(Duration::from_secs(10)).await;
        assert_eq!(summary.completed, 10);
        assert_eq!(summary.aborted, 0);
        assert_eq!(f.dispatcher.in_flight(), 0);
        assert_eq!(f.sink.visible().len(), 10);
        assert!(f.scratch_is_empty());
    }

    #[tokio::test]
    async fn shutdown_aborts_stuck_jobs_and_clears_scratch() {
        let f = fixture(
            FakeExtractor::default(),
            FakeTranscriber::with(TranscriberBehaviour::Hang),
        );
        f.dispatcher.dispatch(event(MediaKind::Voice, 1024)).await;

        for _ in 0..200 {
            if !f.transcriber.calls().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(f.transcriber.calls().len(), 1);
        assert!(!f.scratch_is_empty());

        let summary = f.dispatcher.shutdown(Duration::from_millis(50)).await;
        assert_eq!(summary, ShutdownSummary { completed: 0, aborted: 1 });
        assert!(f.scratch_is_empty());
    }
}
