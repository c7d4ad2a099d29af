//! The per-message transcription pipeline.
//!
//! [`EventDispatcher`] admits inbound media events and spawns one job per
//! event; [`Orchestrator`] drives each job through download, optional audio
//! extraction, transcription, formatting, and reply delivery.

pub mod dispatcher;
pub mod formatter;
pub mod messages;
pub mod orchestrator;

#[cfg(test)]
mod testing;

pub use dispatcher::{DispatchOutcome, EventDispatcher, RejectReason, ShutdownSummary};
pub use formatter::{Segments, TranscriptSegment, chunk};
pub use orchestrator::{JobReport, MESSAGE_LIMIT, Orchestrator, PipelineSettings, compose_replies};
