//! FFmpeg process management.
//!
//! All encoding, re-stamping, and muxing is delegated to the system FFmpeg
//! binary; this module handles spawning, feeding, and monitoring those
//! processes.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};

/// Errors that can occur during FFmpeg operations.
#[derive(Debug)]
pub enum PipelineError {
    /// FFmpeg executable not found
    FfmpegNotFound,
    /// Failed to spawn the FFmpeg process
    SpawnFailed(std::io::Error),
    /// FFmpeg exited with a non-zero status
    ProcessFailed {
        exit_code: Option<i32>,
        stderr: String,
    },
    /// I/O error while feeding or reaping the process
    IoError(std::io::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::FfmpegNotFound => {
                write!(
                    f,
                    "FFmpeg not found. Install it with your package manager (e.g. 'apt install ffmpeg' or 'brew install ffmpeg') and try again"
                )
            }
            PipelineError::SpawnFailed(e) => write!(f, "Failed to spawn FFmpeg: {}", e),
            PipelineError::ProcessFailed { exit_code, stderr } => {
                write!(f, "FFmpeg exited with code {:?}\n{}", exit_code, stderr)
            }
            PipelineError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::SpawnFailed(e) | PipelineError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipelineError::FfmpegNotFound
        } else {
            PipelineError::IoError(e)
        }
    }
}

/// Check whether the FFmpeg binary is reachable.
///
/// Used as a precondition before the rate-correction and mux passes so a
/// missing encoder is reported up front instead of mid-protocol.
pub fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run FFmpeg to completion with the given arguments.
///
/// Stdout is discarded; stderr is collected and attached to the error when
/// the process fails.
pub fn run(args: &[&str]) -> Result<(), PipelineError> {
    let mut child = Command::new("ffmpeg")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::FfmpegNotFound
            } else {
                PipelineError::SpawnFailed(e)
            }
        })?;

    let stderr_output = match child.stderr.take() {
        Some(mut stderr) => {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        }
        None => String::new(),
    };

    let status = child.wait().map_err(PipelineError::IoError)?;
    if !status.success() {
        return Err(PipelineError::ProcessFailed {
            exit_code: status.code(),
            stderr: stderr_output,
        });
    }
    Ok(())
}

/// A running FFmpeg process fed raw frames over stdin.
pub struct FrameWriter {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_thread: Option<JoinHandle<Vec<String>>>,
}

impl FrameWriter {
    /// Spawn FFmpeg with stdin piped.
    ///
    /// A background thread drains stderr so a chatty encoder can never
    /// stall on a full pipe; the collected lines feed the error message if
    /// the process fails.
    pub fn spawn(args: &[&str]) -> Result<Self, PipelineError> {
        let mut child = Command::new("ffmpeg")
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PipelineError::FfmpegNotFound
                } else {
                    PipelineError::SpawnFailed(e)
                }
            })?;

        let stdin = child.stdin.take();

        let stderr_thread = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                let reader = BufReader::new(stderr);
                let mut lines = Vec::new();
                for line in reader.lines().map_while(Result::ok) {
                    log::debug!("[ffmpeg] {}", line);
                    lines.push(line);
                }
                lines
            })
        });

        Ok(Self {
            child,
            stdin,
            stderr_thread,
        })
    }

    /// Write one frame's worth of raw bytes to the encoder.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), PipelineError> {
        match self.stdin.as_mut() {
            Some(stdin) => stdin.write_all(bytes).map_err(PipelineError::IoError),
            None => Err(PipelineError::IoError(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "encoder stdin already closed",
            ))),
        }
    }

    /// Close stdin and wait for the encoder to finish writing the container.
    pub fn finish(mut self) -> Result<(), PipelineError> {
        drop(self.stdin.take());

        let status = self.child.wait().map_err(PipelineError::IoError)?;
        let stderr = self
            .stderr_thread
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(PipelineError::ProcessFailed {
                exit_code: status.code(),
                stderr: stderr.join("\n"),
            });
        }
        Ok(())
    }

    /// Tear down without caring about the container: close stdin, reap the
    /// process. Used on abort paths.
    pub fn abandon(mut self) {
        drop(self.stdin.take());
        let _ = self.child.wait();
        if let Some(handle) = self.stderr_thread.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::FfmpegNotFound;
        let msg = format!("{}", err);
        assert!(msg.contains("FFmpeg not found"));
        assert!(msg.contains("install"));
    }

    #[test]
    fn test_process_failed_error_display() {
        let err = PipelineError::ProcessFailed {
            exit_code: Some(1),
            stderr: "Error message".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("1"));
        assert!(msg.contains("Error message"));
    }

    #[test]
    fn test_not_found_io_error_maps_to_ffmpeg_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            PipelineError::from(io),
            PipelineError::FfmpegNotFound
        ));
    }

    #[test]
    fn test_run_ffmpeg_version() {
        if !ffmpeg_available() {
            return;
        }
        assert!(run(&["-version"]).is_ok());
    }

    #[test]
    fn test_run_invalid_args_fails() {
        if !ffmpeg_available() {
            return;
        }
        let result = run(&["-invalid_nonexistent_flag_xyz"]);
        assert!(matches!(
            result,
            Err(PipelineError::ProcessFailed { .. })
        ));
    }
}
