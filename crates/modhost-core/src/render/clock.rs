//! Frame timing and FPS accounting

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// How often the measured frame rate is published
pub const FPS_SAMPLE_INTERVAL_MS: u64 = 1000;

/// Monotonic millisecond clock
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by `Instant`, counting from construction
#[derive(Debug)]
pub struct SystemTimeSource {
    start: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Deterministic clock advanced by hand
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now_ms: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Frame counter that yields an FPS sample about once a second
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_sample_ms: u64,
    frames_since_sample: u32,
    current_fps: f32,
}

impl FrameClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            last_sample_ms: start_ms,
            frames_since_sample: 0,
            current_fps: 0.0,
        }
    }

    /// Count one rendered frame
    ///
    /// Returns the new FPS value when at least `FPS_SAMPLE_INTERVAL_MS` has
    /// elapsed since the last sample; the counter and timestamp then reset.
    pub fn record_frame(&mut self, now_ms: u64) -> Option<f32> {
        self.frames_since_sample += 1;
        let elapsed_ms = now_ms.saturating_sub(self.last_sample_ms);
        if elapsed_ms < FPS_SAMPLE_INTERVAL_MS {
            return None;
        }

        self.current_fps = self.frames_since_sample as f32 / (elapsed_ms as f32 / 1000.0);
        self.frames_since_sample = 0;
        self.last_sample_ms = now_ms;
        Some(self.current_fps)
    }

    /// Last published frame rate (0 until the first sample)
    pub fn current_fps(&self) -> f32 {
        self.current_fps
    }

    pub fn frames_since_sample(&self) -> u32 {
        self.frames_since_sample
    }
}
