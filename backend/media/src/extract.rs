//! Audio extraction through an external ffmpeg process.
//!
//! The child runs asynchronously under tokio's process driver, so a slow
//! conversion never stalls other jobs. `kill_on_drop` ensures that a caller
//! giving up (timeout, shutdown) also terminates the child.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};
use voxscribe_core::{AudioExtractor, ExtractionError, ExtractionParams};

/// How much of ffmpeg's stderr is kept in the error.
const STDERR_TAIL_CHARS: usize = 600;

pub struct FfmpegExtractor {
    program: PathBuf,
}

impl FfmpegExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run `ffmpeg -version` and return its first line.
    pub async fn probe(&self) -> Result<String, ExtractionError> {
        let output = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            return Err(ExtractionError::Failed {
                code: output.status.code(),
                stderr: String::new(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    fn spawn_error(&self, e: io::Error) -> ExtractionError {
        if e.kind() == io::ErrorKind::NotFound {
            ExtractionError::ToolMissing(self.program.display().to_string())
        } else {
            ExtractionError::Io(e)
        }
    }
}

/// Output path for a hint: always an `.mp3` file.
pub fn output_path(hint: &Path) -> PathBuf {
    hint.with_extension("mp3")
}

/// Arguments for a mono, low-bitrate MP3 without the video stream.
pub fn build_args(input: &Path, output: &Path, params: &ExtractionParams) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];
    args.push("-i".into());
    args.push(input.as_os_str().to_owned());
    args.extend(
        [
            "-vn".to_string(),
            "-acodec".to_string(),
            "libmp3lame".to_string(),
            "-ar".to_string(),
            params.sample_rate.to_string(),
            "-ac".to_string(),
            params.channels.to_string(),
            "-b:a".to_string(),
            params.bitrate.clone(),
            "-y".to_string(),
        ]
        .map(OsString::from),
    );
    args.push(output.as_os_str().to_owned());
    args
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return text.to_string();
    }
    text.chars().skip(count - STDERR_TAIL_CHARS).collect()
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn extract(
        &self,
        input: &Path,
        output_hint: &Path,
        params: &ExtractionParams,
    ) -> Result<PathBuf, ExtractionError> {
        let output = output_path(output_hint);
        let args = build_args(input, &output, params);
        debug!(program = %self.program.display(), ?args, "Running ffmpeg");

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !result.status.success() {
            return Err(ExtractionError::Failed {
                code: result.status.code(),
                stderr: stderr_tail(&result.stderr),
            });
        }

        match fs::metadata(&output).await {
            Ok(meta) if meta.len() > 0 => {
                info!(bytes = meta.len(), output = %output.display(), "Extracted audio track");
                Ok(output)
            }
            Ok(_) => Err(ExtractionError::NoOutput(output.display().to_string())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(ExtractionError::NoOutput(output.display().to_string()))
            }
            Err(e) => Err(ExtractionError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    // Serialises tests that spawn processes; a fork while a fake ffmpeg
    // script is still open for writing makes its exec fail with ETXTBSY.
    static SPAWN_LOCK: Mutex<()> = Mutex::const_new(());

    #[test]
    fn args_request_mono_16k_64k_mp3() {
        let args = build_args(
            Path::new("/s/input.mp4"),
            Path::new("/s/audio.mp3"),
            &ExtractionParams::default(),
        );
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        let joined = args.join(" ");
        assert!(joined.contains("-i /s/input.mp4"));
        assert!(joined.contains("-vn"));
        assert!(joined.contains("-ar 16000"));
        assert!(joined.contains("-ac 1"));
        assert!(joined.contains("-b:a 64k"));
        assert_eq!(args.last().unwrap(), "/s/audio.mp3");
    }

    #[test]
    fn output_always_mp3() {
        assert_eq!(output_path(Path::new("/s/audio")), PathBuf::from("/s/audio.mp3"));
        assert_eq!(output_path(Path::new("/s/audio.wav")), PathBuf::from("/s/audio.mp3"));
    }

    #[test]
    fn stderr_is_truncated_from_the_front() {
        let long = "x".repeat(1000) + "END";
        let tail = stderr_tail(long.as_bytes());
        assert_eq!(tail.chars().count(), STDERR_TAIL_CHARS);
        assert!(tail.ends_with("END"));
    }

    #[tokio::test]
    async fn missing_tool_is_reported() {
        let _guard = SPAWN_LOCK.lock().await;
        let dir = tempfile::tempdir().unwrap();
        let extractor = FfmpegExtractor::new(dir.path().join("no-such-ffmpeg"));
        let err = extractor
            .extract(
                &dir.path().join("in.mp4"),
                &dir.path().join("audio"),
                &ExtractionParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::ToolMissing(_)));
    }

    #[cfg(unix)]
    mod fake_ffmpeg {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("ffmpeg");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn successful_run_returns_output_path() {
            let _guard = SPAWN_LOCK.lock().await;
            let dir = tempfile::tempdir().unwrap();
            // Last argument is the output file.
            let program = write_script(dir.path(), "for last; do :; done\nprintf 'ID3' > \"$last\"");
            let extractor = FfmpegExtractor::new(program);

            let out = extractor
                .extract(
                    &dir.path().join("in.mp4"),
                    &dir.path().join("audio"),
                    &ExtractionParams::default(),
                )
                .await
                .unwrap();
            assert_eq!(out, dir.path().join("audio.mp3"));
            assert_eq!(std::fs::read(&out).unwrap(), b"ID3");
        }

        #[tokio::test]
        async fn non_zero_exit_is_a_failure_with_stderr() {
            let _guard = SPAWN_LOCK.lock().await;
            let dir = tempfile::tempdir().unwrap();
            let program = write_script(dir.path(), "echo 'Invalid data found' >&2\nexit 1");
            let extractor = FfmpegExtractor::new(program);

            let err = extractor
                .extract(
                    &dir.path().join("in.mp4"),
                    &dir.path().join("audio"),
                    &ExtractionParams::default(),
                )
                .await
                .unwrap_err();
            match err {
                ExtractionError::Failed { code, stderr } => {
                    assert_eq!(code, Some(1));
                    assert!(stderr.contains("Invalid data found"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn zero_exit_without_output_is_a_failure() {
            let _guard = SPAWN_LOCK.lock().await;
            let dir = tempfile::tempdir().unwrap();
            let program = write_script(dir.path(), "exit 0");
            let extractor = FfmpegExtractor::new(program);

            let err = extractor
                .extract(
                    &dir.path().join("in.mp4"),
                    &dir.path().join("audio"),
                    &ExtractionParams::default(),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ExtractionError::NoOutput(_)));
        }

        #[tokio::test]
        async fn probe_reads_version_line() {
            let _guard = SPAWN_LOCK.lock().await;
            let dir = tempfile::tempdir().unwrap();
            let program = write_script(dir.path(), "echo 'ffmpeg version 6.1 Copyright'\necho 'built with gcc'");
            let extractor = FfmpegExtractor::new(program);
            assert_eq!(extractor.probe().await.unwrap(), "ffmpeg version 6.1 Copyright");
        }
    }
}
