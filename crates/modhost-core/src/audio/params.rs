//! Process-wide audio parameters
//!
//! After a successful negotiation the resolved sample rate and buffer size are
//! published here so the engine (and anything downstream) can read them
//! lock-free from any thread.

use std::sync::atomic::{AtomicU32, Ordering};

use super::config::{DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE};

static GLOBAL_PARAMS: AudioParams = AudioParams::new();

/// Atomically published sample rate and buffer size
#[derive(Debug)]
pub struct AudioParams {
    sample_rate: AtomicU32,
    buffer_size: AtomicU32,
}

impl AudioParams {
    /// Parameters initialized to the compiled-in defaults
    pub const fn new() -> Self {
        Self {
            sample_rate: AtomicU32::new(DEFAULT_SAMPLE_RATE),
            buffer_size: AtomicU32::new(DEFAULT_BUFFER_SIZE),
        }
    }

    /// The process-wide instance
    pub fn global() -> &'static AudioParams {
        &GLOBAL_PARAMS
    }

    /// Current sample rate in Hz (lock-free)
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Acquire)
    }

    /// Current buffer size in frames (lock-free)
    #[inline]
    pub fn buffer_size(&self) -> u32 {
        self.buffer_size.load(Ordering::Acquire)
    }

    pub fn set_sample_rate(&self, rate: u32) {
        self.sample_rate.store(rate, Ordering::Release);
    }

    pub fn set_buffer_size(&self, frames: u32) {
        self.buffer_size.store(frames, Ordering::Release);
    }
}

impl Default for AudioParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample rate published by the last successful negotiation
pub fn global_sample_rate() -> u32 {
    AudioParams::global().sample_rate()
}

/// Buffer size published by the last successful negotiation
pub fn global_buffer_size() -> u32 {
    AudioParams::global().buffer_size()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_until_published() {
        let params = AudioParams::new();
        assert_eq!(params.sample_rate(), DEFAULT_SAMPLE_RATE);
        assert_eq!(params.buffer_size(), DEFAULT_BUFFER_SIZE);

        params.set_sample_rate(44100);
        params.set_buffer_size(512);
        assert_eq!(params.sample_rate(), 44100);
        assert_eq!(params.buffer_size(), 512);
    }
}
