//! Audio Bridge - the real-time callback boundary
//!
//! ```text
//! platform audio thread ──► AudioBridge::process ──► engine.audio_in(input)
//!                                                └─► engine.audio_out(output)
//! ```
//!
//! Pure forwarding: no resampling, mixing or format conversion, and the
//! render lock is never taken here. Channel counts were fixed at negotiation.

use std::sync::Arc;

use super::block::AudioBlock;
use super::config::ResolvedDeviceConfig;
use super::platform::AudioIoCallback;
use crate::engine::Engine;

/// Forwards hardware blocks to the engine
pub struct AudioBridge<E: Engine> {
    engine: Arc<E>,
}

impl<E: Engine> AudioBridge<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }
}

impl<E: Engine> AudioIoCallback for AudioBridge<E> {
    #[inline]
    fn process(&self, input: &AudioBlock, output: &mut AudioBlock) {
        self.engine.audio_in(input);
        self.engine.audio_out(output);
    }

    fn about_to_start(&self, resolved: &ResolvedDeviceConfig) {
        log::info!(
            "Audio starting: {}Hz, {} frames, {} in / {} out (~{:.1}ms)",
            resolved.sample_rate,
            resolved.buffer_size,
            resolved.input_channels,
            resolved.output_channels,
            resolved.latency_ms()
        );
    }

    fn stopped(&self) {
        log::info!("Audio stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, RecordingEngine};

    #[test]
    fn test_forwards_input_then_output() {
        let engine = Arc::new(RecordingEngine::new());
        let bridge = AudioBridge::new(Arc::clone(&engine));

        let mut input = AudioBlock::new(1, 64);
        input.read_interleaved(&[0.25; 32], 1);
        let mut output = AudioBlock::new(2, 64);
        output.set_frames(32);

        bridge.process(&input, &mut output);

        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::AudioIn { frames: 32, channels: 1 },
                EngineCall::AudioOut { frames: 32, channels: 2 },
            ]
        );
    }

    #[test]
    fn test_never_takes_render_lock() {
        let engine = Arc::new(RecordingEngine::new());
        let bridge = AudioBridge::new(Arc::clone(&engine));

        // Holding the lock on this thread must not stop the audio path
        let _guard = engine.render_lock().lock();
        let input = AudioBlock::new(2, 16);
        let mut output = AudioBlock::new(2, 16);
        bridge.process(&input, &mut output);

        assert_eq!(engine.calls().len(), 2);
    }
}
