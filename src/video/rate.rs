//! Observed frame-rate estimation from wall-clock timestamps.

use std::time::Instant;

/// Rate assumed when a session recorded fewer than two frames.
pub const FALLBACK_FPS: u32 = 10;

/// Estimate the true capture rate from per-frame wall-clock timestamps.
///
/// With N timestamps spanning `last - first` seconds there are N-1 frame
/// intervals, so the observed rate is `round((N - 1) / span)`, floored at
/// 1 fps. Fewer than two timestamps (or a zero span) yields
/// [`FALLBACK_FPS`] - never zero or negative.
pub fn estimate_fps(timestamps: &[Instant]) -> u32 {
    let (Some(first), Some(last)) = (timestamps.first(), timestamps.last()) else {
        return FALLBACK_FPS;
    };
    if timestamps.len() < 2 {
        return FALLBACK_FPS;
    }

    let span = last.duration_since(*first).as_secs_f64();
    if span <= 0.0 {
        return FALLBACK_FPS;
    }

    let fps = ((timestamps.len() - 1) as f64 / span).round() as u32;
    fps.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn timestamps_at(offsets_ms: &[u64]) -> Vec<Instant> {
        let base = Instant::now();
        offsets_ms
            .iter()
            .map(|&ms| base + Duration::from_millis(ms))
            .collect()
    }

    #[test]
    fn test_four_frames_over_1500ms_is_2fps() {
        // 3 intervals over 1.5 s
        let ts = timestamps_at(&[0, 500, 1000, 1500]);
        assert_eq!(estimate_fps(&ts), 2);
    }

    #[test]
    fn test_ten_frames_at_100ms_is_10fps() {
        let ts = timestamps_at(&[0, 100, 200, 300, 400, 500, 600, 700, 800, 900]);
        assert_eq!(estimate_fps(&ts), 10);
    }

    #[test]
    fn test_single_timestamp_is_fallback() {
        let ts = timestamps_at(&[0]);
        assert_eq!(estimate_fps(&ts), FALLBACK_FPS);
    }

    #[test]
    fn test_empty_is_fallback() {
        assert_eq!(estimate_fps(&[]), FALLBACK_FPS);
    }

    #[test]
    fn test_zero_span_is_fallback() {
        let base = Instant::now();
        assert_eq!(estimate_fps(&[base, base]), FALLBACK_FPS);
    }

    #[test]
    fn test_very_slow_capture_floors_at_1fps() {
        // 1 interval over 10 s rounds to 0; floor keeps it at 1
        let ts = timestamps_at(&[0, 10_000]);
        assert_eq!(estimate_fps(&ts), 1);
    }

    #[test]
    fn test_jittery_intervals_round_to_nearest() {
        // 9 intervals over 0.93 s -> 9.68 fps -> rounds to 10
        let ts = timestamps_at(&[0, 90, 200, 310, 400, 520, 610, 700, 830, 930]);
        assert_eq!(estimate_fps(&ts), 10);
    }
}
