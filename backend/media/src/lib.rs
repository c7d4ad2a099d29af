//! Media handling: per-job scratch storage, audio extraction, and format detection.

pub mod extract;
pub mod mime_detect;
pub mod scratch;

pub use extract::FfmpegExtractor;
pub use mime_detect::{detect_mime_type, extension_for_mime, input_extension, is_transcribable};
pub use scratch::{JobScratch, ScratchSpace};
