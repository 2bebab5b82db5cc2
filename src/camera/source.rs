//! Continuous frame acquisition on a dedicated thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;

use super::device::list_devices;
use super::slot::LatestFrame;
use super::types::{CameraError, CameraSettings, Frame, FrameFormat, Resolution};

/// Live camera feed exposing only the most recent frame.
///
/// `open()` validates the device, `start()` spawns the acquisition thread,
/// and `latest()` returns a copy of whatever the thread captured last. There
/// is no frame queue: consumers that poll slower than the camera produces
/// simply skip frames.
pub struct FrameSource {
    /// Latest captured frame, shared with the acquisition thread
    slot: LatestFrame,
    /// Acquisition thread handle
    acquisition_thread: Option<JoinHandle<()>>,
    /// Signal for the thread to exit
    stop_signal: Arc<AtomicBool>,
    /// Current settings
    settings: CameraSettings,
    /// Actual resolution (set after the device opens)
    actual_resolution: Option<Resolution>,
    /// Actual FPS (set after the device opens)
    actual_fps: Option<u32>,
}

impl std::fmt::Debug for FrameSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSource")
            .field("settings", &self.settings)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl FrameSource {
    /// Open a frame source for the camera at `settings.device_index`.
    ///
    /// Device absence is fatal here and surfaced immediately; the stream
    /// itself is opened inside the acquisition thread when `start()` is
    /// called, because the device handle is not safely movable between
    /// threads on every platform.
    ///
    /// # Errors
    /// * `CameraError::DeviceNotFound` - if the device index doesn't exist
    /// * `CameraError::QueryFailed` - if device enumeration fails
    pub fn open(settings: CameraSettings) -> Result<Self, CameraError> {
        let devices = list_devices()?;
        if !devices.iter().any(|d| d.index == settings.device_index) {
            return Err(CameraError::DeviceNotFound(settings.device_index));
        }

        Ok(Self {
            slot: LatestFrame::new(),
            acquisition_thread: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
            settings,
            actual_resolution: None,
            actual_fps: None,
        })
    }

    /// Get the current camera settings.
    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Get the actual resolution the camera negotiated.
    ///
    /// Returns `None` until the source has been started. May differ from
    /// the requested resolution if the camera doesn't support it exactly.
    pub fn actual_resolution(&self) -> Option<Resolution> {
        self.actual_resolution
    }

    /// Get the actual frame rate the camera negotiated.
    pub fn actual_fps(&self) -> Option<u32> {
        self.actual_fps
    }

    /// Start the acquisition thread.
    ///
    /// Blocks until the thread reports that the device stream is open (or
    /// failed to open). Calling `start` while the source is already running
    /// is a no-op.
    ///
    /// # Errors
    /// * `CameraError::StreamFailed` - if the camera stream fails to start
    /// * `CameraError::PermissionDenied` - if camera access is denied (macOS)
    /// * `CameraError::OpenFailed` - if the camera fails to open for other reasons
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.is_running() {
            return Ok(());
        }

        self.stop_signal.store(false, Ordering::SeqCst);

        let slot = self.slot.clone();
        let stop = Arc::clone(&self.stop_signal);
        let settings = self.settings.clone();

        // The thread reports the negotiated resolution/fps (or the open
        // error) back over this channel before entering its loop.
        let (info_tx, info_rx) = mpsc::channel::<Result<(Resolution, u32), CameraError>>();

        let handle = std::thread::spawn(move || {
            acquisition_loop(settings, slot, stop, info_tx);
        });
        self.acquisition_thread = Some(handle);

        match info_rx.recv() {
            Ok(Ok((res, fps))) => {
                self.actual_resolution = Some(res);
                self.actual_fps = Some(fps);
                Ok(())
            }
            Ok(Err(e)) => {
                self.join_thread();
                Err(e)
            }
            Err(_) => {
                self.join_thread();
                Err(CameraError::StreamFailed(
                    "acquisition thread terminated unexpectedly".to_string(),
                ))
            }
        }
    }

    /// Get a copy of the latest captured frame.
    ///
    /// Returns `None` if no frame has arrived yet.
    pub fn latest(&self) -> Option<Frame> {
        self.slot.latest()
    }

    /// Stop the acquisition thread and release the device.
    ///
    /// Blocks until the thread has exited, so the device is guaranteed to be
    /// free when this returns. Safe to call if the source was never started.
    pub fn stop(&mut self) {
        self.join_thread();
    }

    /// Check if the acquisition thread is currently running.
    pub fn is_running(&self) -> bool {
        self.acquisition_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    fn join_thread(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.acquisition_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Body of the acquisition thread.
///
/// Opens the camera, reports the negotiated format through `info_tx`, then
/// reads frames until told to stop. A failed read never touches the slot;
/// the previous frame stays in place and the loop retries.
fn acquisition_loop(
    settings: CameraSettings,
    slot: LatestFrame,
    stop: Arc<AtomicBool>,
    info_tx: Sender<Result<(Resolution, u32), CameraError>>,
) {
    let index = CameraIndex::Index(settings.device_index);

    let mut camera = match open_with_format_fallback(&index, &settings) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = info_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = info_tx.send(Err(CameraError::StreamFailed(e.to_string())));
        return;
    }

    let res = camera.resolution();
    let actual = Resolution {
        width: res.width(),
        height: res.height(),
    };
    let _ = info_tx.send(Ok((actual, camera.frame_rate())));
    log::info!(
        "camera {} streaming at {}x{} @ {} fps",
        settings.device_index,
        actual.width,
        actual.height,
        camera.frame_rate()
    );

    while !stop.load(Ordering::Relaxed) {
        match camera.frame() {
            Ok(raw) => {
                // decode_image handles MJPEG/YUYV/NV12 conversion to RGB
                match raw.decode_image::<RgbFormat>() {
                    Ok(decoded) => {
                        let resolution = raw.resolution();
                        let mut frame = Frame {
                            data: decoded.into_raw(),
                            width: resolution.width(),
                            height: resolution.height(),
                            format: FrameFormat::Rgb,
                            timestamp: Instant::now(),
                        };
                        if settings.mirror {
                            frame.mirror_horizontal();
                        }
                        slot.store(frame);
                    }
                    Err(e) => log::debug!("frame decode failed, skipping: {}", e),
                }
            }
            Err(e) => log::debug!("frame read failed, retrying: {}", e),
        }

        // Brief pause so the stop signal is observed promptly
        std::thread::sleep(Duration::from_millis(1));
    }

    let _ = camera.stop_stream();
    log::info!("camera {} released", settings.device_index);
}

/// Try to open the camera with a sequence of format strategies.
fn open_with_format_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CameraError> {
    // Preference order:
    // 1. Closest match with NV12 (native on macOS)
    // 2. Closest match with MJPEG (widely supported)
    // 3. Highest resolution available (let the camera decide the format)
    let requested_resolution =
        nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height);
    let attempts: Vec<RequestedFormat> = vec![
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested_resolution,
            NokhwaFrameFormat::NV12,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested_resolution,
            NokhwaFrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;
    for requested in attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    let e = last_error.expect("at least one format attempt was made");
    let msg = e.to_string().to_lowercase();
    if msg.contains("permission")
        || msg.contains("denied")
        || msg.contains("authorization")
        || msg.contains("access")
    {
        Err(CameraError::PermissionDenied)
    } else {
        Err(CameraError::OpenFailed(e.to_string()))
    }
}
