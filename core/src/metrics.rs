//! Metric names and the frame pacing monitor of the display.
use ::metrics::{counter, gauge, histogram};
use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};
use tracing::{info, warn};

pub mod names {
    use const_format::concatcp;

    pub const METRIC_NAME_PREFIX: &str = "spectrum_";

    pub const FRAMES_GENERATED: &str = concatcp!(METRIC_NAME_PREFIX, "frames_generated");
    pub const FRAMES_DROPPED: &str = concatcp!(METRIC_NAME_PREFIX, "frames_dropped");
    pub const FRAMES_DISPLAYED: &str = concatcp!(METRIC_NAME_PREFIX, "frames_displayed");
    pub const FPS: &str = concatcp!(METRIC_NAME_PREFIX, "fps");
    pub const FRAME_TIME: &str = concatcp!(METRIC_NAME_PREFIX, "frame_time_ms");
    pub const FREEZES: &str = concatcp!(METRIC_NAME_PREFIX, "freezes");
}

use names::{FPS, FRAME_TIME, FRAMES_DISPLAYED, FREEZES};

/// A frame interval at least this long counts as a freeze.
pub const FREEZE_THRESHOLD: Duration = Duration::from_millis(100);
/// Number of frame intervals the min, max and average are taken over.
pub const ROLLING_WINDOW_SIZE: usize = 128;
/// Time between summary log lines.
pub const LOG_INTERVAL: Duration = Duration::from_secs(5);

const FPS_WINDOW: Duration = Duration::from_secs(1);

#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct FrameMetricsSnapshot {
    pub current_fps: f64,
    pub frame_time_ms: f64,
    pub min_frame_time_ms: f64,
    pub max_frame_time_ms: f64,
    pub avg_frame_time_ms: f64,
    pub freeze_count: u64,
}

/// Tracks how regularly frames reach the display.
///
/// The first recorded frame only starts the clock, every later one contributes the time since
/// its predecessor.
#[derive(Default, Debug)]
pub struct FrameMetrics {
    last_frame: Option<Instant>,
    last_log: Option<Instant>,
    frame_times: VecDeque<f64>,
    recent_frames: VecDeque<Instant>,
    freeze_count: u64,
    snapshot: FrameMetricsSnapshot,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(ROLLING_WINDOW_SIZE),
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> FrameMetricsSnapshot {
        self.snapshot
    }

    pub fn record_frame(&mut self) {
        self.record_frame_at(Instant::now())
    }

    /// Records a frame that reached the display at `now`.
    pub fn record_frame_at(&mut self, now: Instant) {
        counter!(FRAMES_DISPLAYED).increment(1);

        let Some(last_frame) = self.last_frame.replace(now) else {
            self.last_log = Some(now);
            self.snapshot = FrameMetricsSnapshot::default();
            return;
        };

        let elapsed = now.saturating_duration_since(last_frame);
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        if self.frame_times.len() == ROLLING_WINDOW_SIZE {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(elapsed_ms);

        let (min, max, sum) = self.frame_times.iter().fold(
            (f64::MAX, f64::MIN, 0.0),
            |(min, max, sum), &time| (min.min(time), max.max(time), sum + time),
        );
        let avg = sum / self.frame_times.len() as f64;

        if elapsed >= FREEZE_THRESHOLD {
            self.freeze_count += 1;
            counter!(FREEZES).increment(1);
            warn!(
                "Frame freeze detected: {elapsed_ms:.1} ms (freeze #{})",
                self.freeze_count
            );
        }

        self.recent_frames.push_back(now);
        while self
            .recent_frames
            .front()
            .is_some_and(|&frame| now.saturating_duration_since(frame) > FPS_WINDOW)
        {
            self.recent_frames.pop_front();
        }
        let fps = self.recent_frames.len() as f64;

        if self
            .last_log
            .is_none_or(|last_log| now.saturating_duration_since(last_log) >= LOG_INTERVAL)
        {
            self.last_log = Some(now);
            info!(
                "FPS: {fps:.1} | FrameTime avg/min/max: {avg:.2}/{min:.2}/{max:.2} ms | Freezes: {}",
                self.freeze_count
            );
        }

        gauge!(FPS).set(fps);
        histogram!(FRAME_TIME).record(elapsed_ms);

        self.snapshot = FrameMetricsSnapshot {
            current_fps: fps,
            frame_time_ms: elapsed_ms,
            min_frame_time_ms: min,
            max_frame_time_ms: max,
            avg_frame_time_ms: avg,
            freeze_count: self.freeze_count,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn metric_names_share_prefix() {
        assert_eq!(names::FRAMES_GENERATED, "spectrum_frames_generated");
        assert_eq!(names::FRAME_TIME, "spectrum_frame_time_ms");
        for name in [
            names::FRAMES_GENERATED,
            names::FRAMES_DROPPED,
            names::FRAMES_DISPLAYED,
            names::FPS,
            names::FRAME_TIME,
            names::FREEZES,
        ] {
            assert!(name.starts_with(names::METRIC_NAME_PREFIX));
        }
    }

    #[test]
    fn first_frame_only_starts_the_clock() {
        let mut metrics = FrameMetrics::new();
        metrics.record_frame_at(Instant::now());
        assert_eq!(metrics.snapshot(), FrameMetricsSnapshot::default());
    }

    #[test]
    fn frame_time_statistics() {
        let start = Instant::now();
        let mut metrics = FrameMetrics::new();
        metrics.record_frame_at(start);
        metrics.record_frame_at(start + ms(10));
        metrics.record_frame_at(start + ms(40));
        metrics.record_frame_at(start + ms(60));

        let snapshot = metrics.snapshot();
        assert_approx_eq!(snapshot.frame_time_ms, 20.0);
        assert_approx_eq!(snapshot.min_frame_time_ms, 10.0);
        assert_approx_eq!(snapshot.max_frame_time_ms, 30.0);
        assert_approx_eq!(snapshot.avg_frame_time_ms, 20.0);
        assert_eq!(snapshot.freeze_count, 0);
    }

    #[test]
    fn counts_freezes() {
        let start = Instant::now();
        let mut metrics = FrameMetrics::new();
        metrics.record_frame_at(start);
        metrics.record_frame_at(start + ms(99));
        assert_eq!(metrics.snapshot().freeze_count, 0);
        metrics.record_frame_at(start + ms(199));
        metrics.record_frame_at(start + ms(500));
        assert_eq!(metrics.snapshot().freeze_count, 2);
    }

    #[test]
    fn fps_counts_frames_in_the_last_second() {
        let start = Instant::now();
        let mut metrics = FrameMetrics::new();
        metrics.record_frame_at(start);
        for i in 1..=30 {
            metrics.record_frame_at(start + ms(50 * i));
        }
        assert_approx_eq!(metrics.snapshot().current_fps, 21.0);
    }

    #[test]
    fn rolling_window_forgets_old_frames() {
        let start = Instant::now();
        let mut metrics = FrameMetrics::new();
        metrics.record_frame_at(start);
        //  One slow frame followed by a full window of fast ones
        let mut now = start + ms(500);
        metrics.record_frame_at(now);
        for _ in 0..ROLLING_WINDOW_SIZE {
            now += ms(10);
            metrics.record_frame_at(now);
        }
        let snapshot = metrics.snapshot();
        assert_approx_eq!(snapshot.max_frame_time_ms, 10.0);
        assert_eq!(snapshot.freeze_count, 1);
    }
}
