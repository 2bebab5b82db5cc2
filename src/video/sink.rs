//! Intermediate video buffering and the two-pass correction protocol.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::pipeline::{self, FrameWriter, PipelineError};
use crate::render::GlyphImage;

/// Errors from the video sink.
#[derive(Debug)]
pub enum SinkError {
    /// `start` called while a session is already buffering
    SessionActive,
    /// A frame or stop arrived with no active session
    NotActive,
    /// Frame size doesn't match the size the session was started with
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    /// An input file for rate correction or muxing is missing
    MissingInput(PathBuf),
    /// FFmpeg reported success but the declared output doesn't exist
    OutputMissing(PathBuf),
    /// FFmpeg invocation failed
    Pipeline(PipelineError),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::SessionActive => write!(f, "A recording session is already active"),
            SinkError::NotActive => write!(f, "No active recording session"),
            SinkError::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "Frame size {}x{} doesn't match session size {}x{}",
                    actual.0, actual.1, expected.0, expected.1
                )
            }
            SinkError::MissingInput(path) => {
                write!(f, "Input file missing: {}", path.display())
            }
            SinkError::OutputMissing(path) => {
                write!(
                    f,
                    "Encoder reported success but output '{}' was not created",
                    path.display()
                )
            }
            SinkError::Pipeline(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkError::Pipeline(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PipelineError> for SinkError {
    fn from(e: PipelineError) -> Self {
        SinkError::Pipeline(e)
    }
}

/// Buffers rendered glyph images into an intermediate MP4, then reconciles
/// its timing with reality.
///
/// Frames are appended at the *nominal* rate passed to `start`; wall-clock
/// arrival is irregular (scheduling, variable render cost), so after `stop`
/// the container claims the wrong duration. `correct_frame_rate` re-stamps
/// it at the observed rate, and `mux_with_audio` combines the result with
/// the captured audio track.
pub struct VideoSink {
    writer: Option<FrameWriter>,
    dimensions: Option<(u32, u32)>,
    intermediate: Option<PathBuf>,
}

impl VideoSink {
    pub fn new() -> Self {
        Self {
            writer: None,
            dimensions: None,
            intermediate: None,
        }
    }

    /// Whether a session is currently accepting frames.
    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }

    /// Path of the intermediate container, if one exists.
    pub fn intermediate_path(&self) -> Option<&Path> {
        self.intermediate.as_deref()
    }

    /// Open an intermediate container sized exactly (width, height).
    ///
    /// Every frame written during this session must match that size. The
    /// container is written to the system temp directory and encoded at
    /// `nominal_fps`; the true rate is fixed up later.
    pub fn start(&mut self, width: u32, height: u32, nominal_fps: u32) -> Result<(), SinkError> {
        if self.writer.is_some() {
            return Err(SinkError::SessionActive);
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = std::env::temp_dir().join(format!("glyphcam_{}_video.mp4", timestamp));
        let size = format!("{}x{}", width, height);
        let fps = nominal_fps.to_string();
        let path_arg = path.to_string_lossy().to_string();

        // yuv420p requires even dimensions; scale down by at most one pixel
        // per axis rather than rejecting odd canvas sizes.
        let writer = FrameWriter::spawn(&[
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &size,
            "-r",
            &fps,
            "-i",
            "-",
            "-an",
            "-c:v",
            "libx264",
            "-preset",
            "ultrafast",
            "-crf",
            "23",
            "-vf",
            "scale=trunc(iw/2)*2:trunc(ih/2)*2",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
            &path_arg,
        ])?;

        log::info!(
            "video sink opened {} ({} @ nominal {} fps)",
            path.display(),
            size,
            nominal_fps
        );
        self.writer = Some(writer);
        self.dimensions = Some((width, height));
        self.intermediate = Some(path);
        Ok(())
    }

    /// Append one rendered image to the intermediate container.
    ///
    /// Rejected (without side effects) after `stop` or before `start`;
    /// a size mismatch is a caller error rejected synchronously.
    pub fn write_frame(&mut self, image: &GlyphImage) -> Result<(), SinkError> {
        let expected = self.dimensions.ok_or(SinkError::NotActive)?;
        let Some(writer) = self.writer.as_mut() else {
            return Err(SinkError::NotActive);
        };
        let actual = image.dimensions();
        if actual != expected {
            return Err(SinkError::DimensionMismatch { expected, actual });
        }

        writer.write(image.as_raw())?;
        Ok(())
    }

    /// Close the intermediate container and return its path.
    ///
    /// Subsequent `write_frame` calls are rejected until a new session
    /// starts.
    pub fn stop(&mut self) -> Result<PathBuf, SinkError> {
        let writer = self.writer.take().ok_or(SinkError::NotActive)?;
        self.dimensions = None;
        writer.finish()?;

        let path = self
            .intermediate
            .clone()
            .ok_or(SinkError::NotActive)?;
        if !path.exists() {
            return Err(SinkError::OutputMissing(path));
        }
        log::info!("video sink closed {}", path.display());
        Ok(path)
    }

    /// Discard the session: reap the encoder and delete the intermediate.
    ///
    /// Used when a session must be torn down after a partner component
    /// failed to start.
    pub fn abort(&mut self) {
        if let Some(writer) = self.writer.take() {
            writer.abandon();
        }
        self.dimensions = None;
        if let Some(path) = self.intermediate.take() {
            let _ = std::fs::remove_file(path);
        }
    }

    /// Re-stamp the intermediate container at the observed frame rate.
    ///
    /// Re-encodes into a sibling temp file and atomically renames it over
    /// the intermediate only after FFmpeg succeeds, so a failed pass never
    /// leaves a partially-written file as the canonical one.
    pub fn correct_frame_rate(&self, observed_fps: u32) -> Result<(), SinkError> {
        let path = self.intermediate.as_ref().ok_or(SinkError::NotActive)?;
        if !path.exists() {
            return Err(SinkError::MissingInput(path.clone()));
        }

        let corrected = path.with_extension("ratefix.mp4");
        let input = path.to_string_lossy().to_string();
        let output = corrected.to_string_lossy().to_string();
        let fps = observed_fps.to_string();

        let result = pipeline::run(&[
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-i",
            &input,
            "-r",
            &fps,
            &output,
        ]);

        match result {
            Ok(()) if corrected.exists() => {
                std::fs::rename(&corrected, path).map_err(PipelineError::IoError)?;
                log::info!("re-stamped {} at {} fps", path.display(), observed_fps);
                Ok(())
            }
            Ok(()) => Err(SinkError::OutputMissing(corrected)),
            Err(e) => {
                // Never leave a partial file next to the good intermediate
                let _ = std::fs::remove_file(&corrected);
                Err(e.into())
            }
        }
    }

    /// Combine the corrected intermediate with the captured audio into
    /// `final_path`.
    ///
    /// The longer stream is trimmed to the shorter one, preventing trailing
    /// silence or freeze-frame from mismatched durations. Both inputs are
    /// deleted only once the final container is confirmed on disk; any
    /// failure preserves them so the capture is not lost.
    pub fn mux_with_audio(
        &mut self,
        audio_path: &Path,
        final_path: &Path,
    ) -> Result<PathBuf, SinkError> {
        let video_path = self.intermediate.clone().ok_or(SinkError::NotActive)?;
        if !video_path.exists() {
            return Err(SinkError::MissingInput(video_path));
        }
        if !audio_path.exists() {
            return Err(SinkError::MissingInput(audio_path.to_path_buf()));
        }

        let video = video_path.to_string_lossy().to_string();
        let audio = audio_path.to_string_lossy().to_string();
        let output = final_path.to_string_lossy().to_string();

        pipeline::run(&[
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-i",
            &video,
            "-i",
            &audio,
            "-c:v",
            "copy",
            "-c:a",
            "aac",
            "-b:a",
            "192k",
            "-map",
            "0:v",
            "-map",
            "1:a",
            "-shortest",
            "-movflags",
            "+faststart",
            &output,
        ])?;

        if !final_path.exists() {
            return Err(SinkError::OutputMissing(final_path.to_path_buf()));
        }

        // The mux succeeded; the intermediates are now redundant.
        let _ = std::fs::remove_file(&video_path);
        let _ = std::fs::remove_file(audio_path);
        self.intermediate = None;

        log::info!("muxed final video {}", final_path.display());
        Ok(final_path.to_path_buf())
    }

    /// Test hook: adopt an existing file as the closed intermediate.
    #[cfg(test)]
    pub(crate) fn with_intermediate(path: PathBuf) -> Self {
        Self {
            writer: None,
            dimensions: None,
            intermediate: Some(path),
        }
    }
}

impl Default for VideoSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for VideoSink {
    fn drop(&mut self) {
        // An abandoned mid-session sink is a cancellation: reap the encoder
        // and remove its partial container. Closed sessions keep their
        // artifacts for the reconciliation steps.
        if self.writer.is_some() {
            self.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_write_frame_without_session_is_rejected() {
        let mut sink = VideoSink::new();
        let image = GlyphImage::new(4, 4);
        assert!(matches!(
            sink.write_frame(&image),
            Err(SinkError::NotActive)
        ));
    }

    #[test]
    fn test_stop_without_session_is_rejected() {
        let mut sink = VideoSink::new();
        assert!(matches!(sink.stop(), Err(SinkError::NotActive)));
    }

    #[test]
    fn test_correct_frame_rate_without_session_is_rejected() {
        let sink = VideoSink::new();
        assert!(matches!(
            sink.correct_frame_rate(10),
            Err(SinkError::NotActive)
        ));
    }

    #[test]
    fn test_mux_missing_audio_preserves_video() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("video.mp4");
        fs::write(&video, b"not a real container").unwrap();

        let mut sink = VideoSink::with_intermediate(video.clone());
        let result = sink.mux_with_audio(dir.path().join("missing.wav").as_path(),
            dir.path().join("final.mp4").as_path());

        assert!(matches!(result, Err(SinkError::MissingInput(_))));
        assert!(video.exists(), "video input must survive a failed mux");
    }

    #[test]
    fn test_mux_failure_preserves_both_inputs() {
        // Inputs exist but aren't valid containers, so whether FFmpeg is
        // missing or present the mux fails - and must delete nothing.
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("video.mp4");
        let audio = dir.path().join("audio.wav");
        fs::write(&video, b"garbage").unwrap();
        fs::write(&audio, b"garbage").unwrap();

        let mut sink = VideoSink::with_intermediate(video.clone());
        let result = sink.mux_with_audio(&audio, dir.path().join("final.mp4").as_path());

        assert!(result.is_err());
        assert!(video.exists());
        assert!(audio.exists());
    }

    #[test]
    fn test_correct_frame_rate_failure_keeps_original() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("video.mp4");
        fs::write(&video, b"garbage").unwrap();

        let sink = VideoSink::with_intermediate(video.clone());
        let result = sink.correct_frame_rate(12);

        assert!(result.is_err());
        assert!(video.exists(), "original must survive a failed re-encode");
        assert!(
            !video.with_extension("ratefix.mp4").exists(),
            "no partial re-encode may be left behind"
        );
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = SinkError::DimensionMismatch {
            expected: (640, 480),
            actual: (320, 240),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("320x240"));
        assert!(msg.contains("640x480"));
    }
}
