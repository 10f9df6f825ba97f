//! The host object
//!
//! Owns the engine handle and three independently built adapters:
//!
//! ```text
//! Host
//!  ├── audio:  platform + AudioBridge      (device callbacks)
//!  ├── timer:  RenderLoopDriver + FrameRenderer
//!  └── input:  InputNormalizer
//! ```
//!
//! The window layer calls into the host; the host never terminates the
//! process. Negotiation failures go to `Engine::set_fatal_error`.

use std::path::PathBuf;
use std::sync::Arc;

use crate::audio::{
    negotiate, AudioBridge, AudioParams, AudioPlatform, DeviceConfig, ResolvedDeviceConfig,
};
use crate::engine::Engine;
use crate::input::{InputNormalizer, KeyStateQuery, RawButton, RawKeyPress, ScrollEvent};
use crate::render::{
    FocusControl, FrameRenderer, PointerState, RenderLoopDriver, RepaintScheduler, VectorSurface,
    WindowMetrics,
};

/// Audio device adapter: the platform plus the bridge registered with it
struct AudioAdapter<P: AudioPlatform> {
    platform: P,
    resolved: Option<ResolvedDeviceConfig>,
}

impl<P: AudioPlatform> AudioAdapter<P> {
    /// Unregister first, then close; a callback must never fire into a closed device
    fn teardown(&mut self) {
        self.platform.remove_callback();
        self.platform.close_device();
        self.resolved = None;
    }
}

/// Real-time host shell
pub struct Host<E: Engine, P: AudioPlatform> {
    engine: Arc<E>,
    audio: AudioAdapter<P>,
    driver: RenderLoopDriver,
    renderer: FrameRenderer,
    input: InputNormalizer,
    shut_down: bool,
}

impl<E: Engine, P: AudioPlatform> Host<E, P> {
    pub fn new(engine: Arc<E>, platform: P) -> Self {
        Self {
            engine,
            audio: AudioAdapter {
                platform,
                resolved: None,
            },
            driver: RenderLoopDriver::new(),
            renderer: FrameRenderer::new(),
            input: InputNormalizer::new(),
            shut_down: false,
        }
    }

    /// Replace the frame renderer (e.g. one with a custom time source)
    pub fn with_renderer(mut self, renderer: FrameRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn platform(&self) -> &P {
        &self.audio.platform
    }

    /// Negotiate the device and start audio, publishing process-wide parameters
    pub fn start_audio(&mut self, config: &DeviceConfig) -> Option<ResolvedDeviceConfig> {
        self.start_audio_with_params(config, AudioParams::global())
    }

    /// Negotiate the device and start audio, publishing into `params`
    ///
    /// On failure the engine receives the fatal message, the device is closed
    /// and `None` is returned.
    pub fn start_audio_with_params(
        &mut self,
        config: &DeviceConfig,
        params: &AudioParams,
    ) -> Option<ResolvedDeviceConfig> {
        if self.audio.platform.has_callback() {
            log::warn!("Audio already running, ignoring start request");
            return self.audio.resolved.clone();
        }
        // The device is opened again, so it needs a teardown again
        self.shut_down = false;

        let bridge = Arc::new(AudioBridge::new(Arc::clone(&self.engine)));
        match negotiate(&mut self.audio.platform, config, bridge, params) {
            Ok(resolved) => {
                self.audio.resolved = Some(resolved.clone());
                Some(resolved)
            }
            Err(e) => {
                log::error!("Audio negotiation failed: {}", e);
                self.audio.platform.close_device();
                self.engine.set_fatal_error(e.fatal_message());
                None
            }
        }
    }

    /// Configuration granted by the last successful negotiation
    pub fn resolved_audio(&self) -> Option<&ResolvedDeviceConfig> {
        self.audio.resolved.as_ref()
    }

    /// One 60 Hz timer tick
    pub fn tick(&mut self, focus: &mut dyn FocusControl, repaint: &mut dyn RepaintScheduler) {
        self.driver.tick(&*self.engine, focus, repaint);
    }

    /// One repaint; see `FrameRenderer::render_frame`
    pub fn render_frame(
        &mut self,
        window: &WindowMetrics,
        screen_pointer: (f32, f32),
        surface: Option<&mut dyn VectorSurface>,
    ) -> Option<f32> {
        self.renderer
            .render_frame(&*self.engine, window, screen_pointer, surface)
    }

    pub fn current_fps(&self) -> f32 {
        self.renderer.current_fps()
    }

    /// Pointer position sent with the last rendered frame
    pub fn pointer(&self) -> PointerState {
        self.renderer.pointer()
    }

    pub fn key_pressed(&mut self, key: RawKeyPress) -> bool {
        self.input.key_pressed(&*self.engine, key)
    }

    pub fn key_state_changed(&mut self, is_key_down: bool, keys: &dyn KeyStateQuery) -> bool {
        self.input.key_state_changed(&*self.engine, is_key_down, keys)
    }

    pub fn mouse_pressed(&self, x: i32, y: i32, button: RawButton) {
        self.input.mouse_pressed(&*self.engine, x, y, button);
    }

    pub fn mouse_released(&self, x: i32, y: i32, button: RawButton) {
        self.input.mouse_released(&*self.engine, x, y, button);
    }

    pub fn mouse_dragged(&self, x: i32, y: i32, button: RawButton) {
        self.input.mouse_dragged(&*self.engine, x, y, button);
    }

    pub fn pointer_moved(&self, x: i32, y: i32) {
        self.input.pointer_moved(x, y);
    }

    pub fn mouse_scrolled(&self, scroll: ScrollEvent) -> bool {
        self.input.mouse_scrolled(&*self.engine, scroll)
    }

    pub fn is_interested_in_file_drag(&self, paths: &[PathBuf]) -> bool {
        self.input.is_interested_in_file_drag(paths)
    }

    pub fn files_dropped(&self, paths: &[PathBuf], x: i32, y: i32) {
        self.input.files_dropped(&*self.engine, paths, x, y);
    }

    /// Stop audio: unregister the callback, then close the device
    ///
    /// Safe to call more than once; also runs on drop.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.audio.teardown();
        log::info!("Host shut down");
    }
}

impl<E: Engine, P: AudioPlatform> Drop for Host<E, P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
