pub mod whisper;

pub use whisper::{WhisperClient, classify_status};
