//! Video sink module: intermediate buffering, rate correction, and muxing.

mod rate;
mod sink;

pub use rate::{estimate_fps, FALLBACK_FPS};
pub use sink::{SinkError, VideoSink};
