//! Latest-wins frame slot shared between the acquisition thread and consumers.

use std::sync::{Arc, Mutex};

use super::types::Frame;

/// A single-slot frame buffer with overwrite semantics.
///
/// The acquisition thread overwrites the slot on every successful capture;
/// consumers copy the current contents out. A slow consumer silently skips
/// intermediate frames - the slot trades completeness for latency.
///
/// The lock is held only for the duration of a store or a copy, never
/// across a device or I/O call.
#[derive(Clone, Default)]
pub struct LatestFrame {
    inner: Arc<Mutex<Option<Frame>>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with a new frame, discarding any unread previous one.
    pub fn store(&self, frame: Frame) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(frame);
        }
    }

    /// Copy out the most recent frame, or `None` if nothing has arrived yet.
    pub fn latest(&self) -> Option<Frame> {
        let slot = self.inner.lock().ok()?;
        slot.clone()
    }
}
