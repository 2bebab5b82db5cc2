//! Camera types and data structures.

use std::fmt;
use std::time::Instant;

/// Information about an available camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index for selection
    pub index: u32,
    /// Human-readable device name
    pub name: String,
    /// Device description
    pub description: String,
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}

/// Camera resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// 480p (640x480) - fast, low bandwidth
    pub const P480: Resolution = Resolution {
        width: 640,
        height: 480,
    };

    /// 720p (1280x720) - balanced, recommended
    pub const P720: Resolution = Resolution {
        width: 1280,
        height: 720,
    };

    /// 1080p (1920x1080) - highest detail, highest render cost
    pub const P1080: Resolution = Resolution {
        width: 1920,
        height: 1080,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::P720
    }
}

/// Pixel format of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// Packed RGB, 3 bytes per pixel
    Rgb,
}

/// A captured camera frame.
///
/// Frames are produced by the acquisition thread and handed to consumers
/// by value, so holding one across a render pass never races the next
/// capture.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data in RGB order
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
    /// When the device reported this capture
    pub timestamp: Instant,
}

impl Frame {
    /// Get the number of bytes per pixel (3 for RGB).
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
        }
    }

    /// Flip the frame left-right in place (selfie mode).
    pub fn mirror_horizontal(&mut self) {
        let width = self.width as usize;
        let height = self.height as usize;
        let bpp = self.bytes_per_pixel();

        for y in 0..height {
            let row_start = y * width * bpp;
            let row = &mut self.data[row_start..row_start + width * bpp];

            for x in 0..width / 2 {
                let left = x * bpp;
                let right = (width - 1 - x) * bpp;
                for i in 0..bpp {
                    row.swap(left + i, right + i);
                }
            }
        }
    }
}

/// Settings for camera capture.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Camera device index
    pub device_index: u32,
    /// Requested capture resolution (actual may vary)
    pub resolution: Resolution,
    /// Target FPS (actual may vary)
    pub fps: u32,
    /// Mirror horizontally (selfie mode)
    pub mirror: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            resolution: Resolution::default(),
            fps: 30,
            mirror: true, // Default to selfie mode
        }
    }
}

/// Errors that can occur during camera operations.
#[derive(Debug)]
pub enum CameraError {
    /// Failed to query camera devices
    QueryFailed(String),
    /// Camera device not found at the specified index
    DeviceNotFound(u32),
    /// Failed to open the camera
    OpenFailed(String),
    /// Camera permission denied (macOS)
    PermissionDenied,
    /// Failed to start the video stream
    StreamFailed(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::QueryFailed(msg) => write!(f, "Failed to query cameras: {}", msg),
            CameraError::DeviceNotFound(index) => {
                write!(
                    f,
                    "Camera device {} not found. Run 'glyphcam list-cameras' to see available devices",
                    index
                )
            }
            CameraError::OpenFailed(msg) => write!(f, "Failed to open camera: {}", msg),
            CameraError::PermissionDenied => {
                write!(
                    f,
                    "Camera permission denied. On macOS, grant access in System Settings > Privacy & Security > Camera"
                )
            }
            CameraError::StreamFailed(msg) => write!(f, "Failed to start camera stream: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}
