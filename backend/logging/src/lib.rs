//! Structured logging for voxscribe.
//!
//! Sets up the global `tracing` subscriber and scrubs credentials out of
//! strings before they reach a log line.

pub mod logger;
pub mod redact;

pub use logger::init_logger;
pub use redact::redact_sensitive_data;
