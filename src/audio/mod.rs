//! Microphone capture module.
//!
//! Provides continuous audio capture via [`AudioRecorder`] and device
//! enumeration via [`list_input_devices`]. Captured chunks accumulate in
//! memory and are flushed to a WAV file when the recorder stops.

mod recorder;
mod wav;

pub use recorder::{list_input_devices, AudioRecorder};
pub use wav::flush_to_wav;

use std::fmt;
use std::path::PathBuf;

/// Errors that can occur during audio operations.
#[derive(Debug)]
pub enum AudioError {
    /// No audio input devices are available
    NoDevices,
    /// The named input device was not found
    DeviceNotFound(String),
    /// Failed to query the device's stream configuration
    ConfigFailed(String),
    /// The device produces a sample format we don't handle
    UnsupportedFormat(String),
    /// Failed to build or start the input stream
    StreamFailed(String),
    /// Stop was called but no audio chunks were captured
    EmptyCapture,
    /// Failed to write the WAV file
    WriteFailed { path: PathBuf, message: String },
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::NoDevices => {
                write!(
                    f,
                    "No audio input devices found. Make sure a microphone is connected and microphone permission is granted"
                )
            }
            AudioError::DeviceNotFound(name) => {
                write!(
                    f,
                    "Audio input device '{}' not found. Run 'glyphcam list-audio-devices' to see available devices",
                    name
                )
            }
            AudioError::ConfigFailed(msg) => {
                write!(f, "Failed to query audio input config: {}", msg)
            }
            AudioError::UnsupportedFormat(fmt_name) => {
                write!(f, "Unsupported audio sample format: {}", fmt_name)
            }
            AudioError::StreamFailed(msg) => write!(f, "Failed to start audio stream: {}", msg),
            AudioError::EmptyCapture => {
                write!(
                    f,
                    "No audio was captured; nothing to write. Check microphone permissions and availability"
                )
            }
            AudioError::WriteFailed { path, message } => {
                write!(
                    f,
                    "Failed to write audio file '{}': {}",
                    path.display(),
                    message
                )
            }
        }
    }
}

impl std::error::Error for AudioError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_display() {
        assert!(format!("{}", AudioError::EmptyCapture).contains("No audio was captured"));
        assert!(format!("{}", AudioError::DeviceNotFound("USB Mic".into())).contains("USB Mic"));
        assert!(format!("{}", AudioError::NoDevices).contains("microphone"));
    }
}
