//! Camera capture module for webcam access and frame acquisition.
//!
//! This module provides a high-level API for camera operations:
//! - Device enumeration via [`list_devices`]
//! - Continuous background acquisition via [`FrameSource`]
//! - Configuration via [`CameraSettings`] and [`Resolution`]

mod device;
mod slot;
mod source;
mod types;

pub use device::list_devices;
pub use slot::LatestFrame;
pub use source::FrameSource;
pub use types::{CameraError, CameraInfo, CameraSettings, Frame, FrameFormat, Resolution};
