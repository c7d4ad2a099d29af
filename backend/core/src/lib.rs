pub mod error;
pub mod job;
pub mod traits;
pub mod types;

pub use error::{
    DeliveryError, DownloadError, ExtractionError, FailureCategory, PipelineError,
    TranscriptionError, TranscriptionErrorKind,
};
pub use job::{InvalidTransition, Job, JobId, JobStage, JobStatus};
pub use traits::{AudioExtractor, MediaSource, ReplySink, Transcriber};
pub use types::{ChatRef, ExtractionParams, InboundEvent, MediaKind, MediaReference, SentMessage};
