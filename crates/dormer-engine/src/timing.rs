//! Frame timing.
//!
//! Measures wall-clock delta between redraws and optionally caps the frame
//! rate when VSync is off. Gameplay does its own fixed stepping, so this
//! module only hands out variable deltas: a clamped one for movement and the
//! raw wall-clock one for timers that must keep running through stalls.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Longest delta handed to gameplay after a stall (window drag, breakpoint).
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Samples kept for the rolling FPS average.
const FRAME_SAMPLES: usize = 120;

/// Time that passed since the previous frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameDelta {
    /// Seconds, clamped to [`MAX_FRAME_DELTA`]
    pub dt: f32,
    /// Unclamped wall-clock seconds, unaffected by [`FrameTiming::reset`]
    pub elapsed: f32,
}

/// Frame timing manager.
#[derive(Debug)]
pub struct FrameTiming {
    /// Time budget per frame
    frame_budget: Duration,
    /// Time of last frame start
    last_frame: Instant,
    /// Time of last frame start, never reset
    last_wall: Instant,
    /// Whether VSync is enabled (disables manual frame limiting)
    vsync: bool,
    /// Recent frame times for averaging
    frame_times: VecDeque<f32>,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FrameTiming {
    /// Create a frame timer targeting `target_fps` when VSync is off.
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        let target_fps = target_fps.max(1);
        let now = Instant::now();
        Self {
            frame_budget: Duration::from_secs_f64(1.0 / f64::from(target_fps)),
            last_frame: now,
            last_wall: now,
            vsync: true,
            frame_times: VecDeque::with_capacity(FRAME_SAMPLES),
        }
    }

    /// Create with VSync setting.
    #[must_use]
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Time since the previous call.
    pub fn delta_time(&mut self) -> FrameDelta {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        let elapsed = (now - self.last_wall).as_secs_f32();
        self.last_frame = now;
        self.last_wall = now;
        FrameDelta {
            dt: self.record(dt.min(MAX_FRAME_DELTA)),
            elapsed,
        }
    }

    fn record(&mut self, dt: f32) -> f32 {
        self.frame_times.push_back(dt);
        if self.frame_times.len() > FRAME_SAMPLES {
            self.frame_times.pop_front();
        }
        dt
    }

    /// Sleep for the remainder of the frame budget (if VSync is off).
    pub fn sleep_remainder(&self) {
        if self.vsync {
            return;
        }

        let elapsed = self.last_frame.elapsed();
        if elapsed < self.frame_budget {
            let sleep_time = self.frame_budget - elapsed;
            if sleep_time > Duration::from_millis(1) {
                std::thread::sleep(sleep_time - Duration::from_millis(1));
            }
            while self.last_frame.elapsed() < self.frame_budget {
                std::hint::spin_loop();
            }
        }
    }

    /// Current FPS averaged over recent frames.
    #[must_use]
    pub fn current_fps(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }

        let avg = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }

    /// Forget history. Call after the window regains focus or loading stalls.
    ///
    /// Only the clamped delta restarts; wall-clock elapsed time keeps counting.
    pub fn reset(&mut self) {
        self.last_frame = Instant::now();
        self.frame_times.clear();
    }
}

/// FPS counter for the debug overlay, refreshed twice a second.
#[derive(Debug)]
pub struct FpsCounter {
    frame_count: u32,
    last_update: Instant,
    update_interval: Duration,
    current_fps: f32,
    current_frame_time: f32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl FpsCounter {
    /// Create a new FPS counter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            last_update: Instant::now(),
            update_interval: Duration::from_millis(500),
            current_fps: 0.0,
            current_frame_time: 0.0,
        }
    }

    /// Tick the counter. Returns (fps, frame_time_ms).
    pub fn tick(&mut self) -> (f32, f32) {
        self.frame_count += 1;

        let elapsed = self.last_update.elapsed();
        if elapsed >= self.update_interval {
            let secs = elapsed.as_secs_f32();
            self.current_fps = self.frame_count as f32 / secs;
            self.current_frame_time = (secs / self.frame_count as f32) * 1000.0;
            self.frame_count = 0;
            self.last_update = Instant::now();
        }

        (self.current_fps, self.current_frame_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_is_clamped() {
        let mut timing = FrameTiming::new(60);
        let stalled = Instant::now() - Duration::from_secs(3);
        timing.last_frame = stalled;
        timing.last_wall = stalled;

        let delta = timing.delta_time();
        assert_eq!(delta.dt, MAX_FRAME_DELTA);
        assert!(delta.elapsed >= 3.0);
    }

    #[test]
    fn test_reset_keeps_wall_clock() {
        let mut timing = FrameTiming::new(60);
        timing.last_wall = Instant::now() - Duration::from_secs(2);
        timing.reset();

        let delta = timing.delta_time();
        assert!(delta.dt < 1.0);
        assert!(delta.elapsed >= 2.0);
    }

    #[test]
    fn test_fps_average() {
        let mut timing = FrameTiming::new(60);
        assert_eq!(timing.current_fps(), 0.0);
        for _ in 0..10 {
            timing.record(0.02);
        }
        assert!((timing.current_fps() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_sample_window_bounded() {
        let mut timing = FrameTiming::new(60);
        for _ in 0..(FRAME_SAMPLES * 2) {
            timing.record(0.01);
        }
        assert_eq!(timing.frame_times.len(), FRAME_SAMPLES);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut timing = FrameTiming::new(60).with_vsync(false);
        timing.record(0.016);
        timing.reset();
        assert_eq!(timing.current_fps(), 0.0);
    }

    #[test]
    fn test_zero_target_fps() {
        let timing = FrameTiming::new(0);
        assert_eq!(timing.frame_budget, Duration::from_secs(1));
    }

    #[test]
    fn test_fps_counter_starts_at_zero() {
        let mut counter = FpsCounter::new();
        let (fps, ms) = counter.tick();
        assert_eq!(fps, 0.0);
        assert_eq!(ms, 0.0);
    }
}
