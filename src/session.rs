//! Recording session lifecycle and the A/V reconciliation protocol.
//!
//! A session owns a video sink and an audio recorder, records a wall-clock
//! timestamp for every forwarded frame, and on stop reconciles the two
//! independently-timed streams: estimate the true frame rate, re-stamp the
//! intermediate video, then mux it with the audio track.

use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;

use crate::audio::{AudioError, AudioRecorder};
use crate::output::{self, OutputError};
use crate::pipeline;
use crate::render::GlyphImage;
use crate::video::{estimate_fps, SinkError, VideoSink};

/// Nominal rate the intermediate container is opened with. The real rate is
/// unknowable until the session ends; this value only has to be plausible
/// enough for preview tooling on the intermediate file.
pub const NOMINAL_RECORD_FPS: u32 = 20;

/// Session-level failures, aggregating component errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Output(#[from] OutputError),

    /// FFmpeg disappeared between capture and reconciliation. The raw
    /// captures are preserved at the reported paths so nothing is lost.
    #[error(
        "FFmpeg is required to finish the recording but was not found. \
         Install it (e.g. 'apt install ffmpeg' or 'brew install ffmpeg'); \
         the raw captures were kept at '{}' and '{}'",
        .video.display(),
        .audio.display()
    )]
    EncoderMissing { video: PathBuf, audio: PathBuf },
}

/// An active recording: glyph video plus microphone audio.
///
/// Exactly one session exists at a time; the value is consumed by `stop`,
/// and both sources are immediately ready for a fresh session afterward.
pub struct RecordingSession {
    sink: VideoSink,
    audio: AudioRecorder,
    timestamps: Vec<Instant>,
    video_dir: PathBuf,
}

impl RecordingSession {
    /// Start recording: open the intermediate container and begin audio
    /// capture together.
    ///
    /// If audio fails to start, the partially-opened video sink is torn
    /// down (encoder reaped, intermediate deleted) before the error is
    /// returned, so a failed start leaves nothing behind.
    pub fn start(
        width: u32,
        height: u32,
        audio_device: Option<&str>,
        video_dir: PathBuf,
    ) -> Result<Self, SessionError> {
        let mut audio = AudioRecorder::open(audio_device)?;

        let mut sink = VideoSink::new();
        sink.start(width, height, NOMINAL_RECORD_FPS)?;

        if let Err(e) = audio.start() {
            sink.abort();
            return Err(e.into());
        }

        log::info!("recording session started at {}x{}", width, height);
        Ok(Self {
            sink,
            audio,
            timestamps: Vec::new(),
            video_dir,
        })
    }

    /// Forward one rendered frame to the sink, stamping its arrival time.
    ///
    /// Frames are written in arrival order; the timestamp sequence drives
    /// the rate estimate at stop.
    pub fn forward_frame(&mut self, image: &GlyphImage) -> Result<(), SessionError> {
        self.sink.write_frame(image)?;
        self.timestamps.push(Instant::now());
        Ok(())
    }

    /// Number of frames forwarded so far.
    pub fn frame_count(&self) -> usize {
        self.timestamps.len()
    }

    /// Stop recording and produce the final muxed file.
    ///
    /// Protocol: close both streams, estimate the observed fps from the
    /// timestamp sequence, verify FFmpeg is reachable, re-stamp the video
    /// at the observed rate, then mux. Every failure path preserves the
    /// artifacts of the step that failed.
    pub fn stop(mut self) -> Result<PathBuf, SessionError> {
        let video_path = self.sink.stop()?;
        let audio_path = self.audio.stop()?;

        let observed_fps = estimate_fps(&self.timestamps);
        log::info!(
            "session captured {} frames, observed rate {} fps",
            self.timestamps.len(),
            observed_fps
        );

        if !pipeline::ffmpeg_available() {
            return Err(SessionError::EncoderMissing {
                video: video_path,
                audio: audio_path,
            });
        }

        self.sink.correct_frame_rate(observed_fps)?;

        let final_path = output::video_output_path(&self.video_dir)?;
        let out = self.sink.mux_with_audio(&audio_path, &final_path)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_fps_constant() {
        // The nominal rate is intentionally not the fallback estimate
        assert_eq!(NOMINAL_RECORD_FPS, 20);
        assert_ne!(NOMINAL_RECORD_FPS, crate::video::FALLBACK_FPS);
    }

    #[test]
    fn test_encoder_missing_error_names_artifacts() {
        let err = SessionError::EncoderMissing {
            video: PathBuf::from("/tmp/v.mp4"),
            audio: PathBuf::from("/tmp/a.wav"),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("/tmp/v.mp4"));
        assert!(msg.contains("/tmp/a.wav"));
        assert!(msg.contains("FFmpeg"));
    }
}
