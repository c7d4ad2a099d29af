//! MIME type and extension detection for media files.
//!
//! The transcription backend infers the container from the upload's file
//! name, so downloaded files must carry a meaningful extension.

use std::path::Path;

use voxscribe_core::MediaKind;

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "mp3" | "mpga" | "mpeg" => "audio/mpeg",
        "ogg" | "oga" | "opus"  => "audio/ogg",
        "wav"                   => "audio/wav",
        "flac"                  => "audio/flac",
        "m4a"                   => "audio/mp4",
        "aac"                   => "audio/aac",
        "mp4"                   => "video/mp4",
        "webm"                  => "video/webm",
        "mov"                   => "video/quicktime",
        "mkv"                   => "video/x-matroska",
        _                       => "application/octet-stream",
    }
}

/// Map a declared MIME type to a file extension.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
    let ext = match essence.as_str() {
        "audio/mpeg" | "audio/mp3"               => "mp3",
        "audio/ogg" | "audio/opus"               => "ogg",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/flac" | "audio/x-flac"            => "flac",
        "audio/mp4" | "audio/x-m4a" | "audio/m4a" => "m4a",
        "audio/aac"                              => "aac",
        "audio/webm" | "video/webm"              => "webm",
        "video/mp4"                              => "mp4",
        "video/quicktime"                        => "mov",
        _ => return None,
    };
    Some(ext)
}

/// Extension to give the downloaded input of a job.
pub fn input_extension(kind: MediaKind, declared_mime: Option<&str>) -> &'static str {
    declared_mime
        .and_then(extension_for_mime)
        .unwrap_or_else(|| kind.default_extension())
}

/// Whether the OpenAI transcription endpoint accepts this file as-is.
pub fn is_transcribable(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    matches!(
        ext.as_str(),
        "flac" | "m4a" | "mp3" | "mp4" | "mpeg" | "mpga" | "oga" | "ogg" | "wav" | "webm"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_voice_ogg() {
        assert_eq!(detect_mime_type(&PathBuf::from("input.ogg")), "audio/ogg");
    }

    #[test]
    fn unknown_extension_fallback() {
        assert_eq!(detect_mime_type(&PathBuf::from("input.bin")), "application/octet-stream");
    }

    #[test]
    fn declared_mime_wins_over_kind_default() {
        assert_eq!(input_extension(MediaKind::Audio, Some("audio/mpeg")), "mp3");
        assert_eq!(input_extension(MediaKind::Audio, Some("audio/x-m4a; codecs=aac")), "m4a");
        assert_eq!(input_extension(MediaKind::Audio, None), "mp3");
        assert_eq!(input_extension(MediaKind::Voice, Some("application/x-unknown")), "ogg");
    }

    #[test]
    fn transcribable_formats() {
        assert!(is_transcribable(Path::new("a.mp3")));
        assert!(is_transcribable(Path::new("voice.OGG")));
        assert!(!is_transcribable(Path::new("a.bin")));
    }
}
