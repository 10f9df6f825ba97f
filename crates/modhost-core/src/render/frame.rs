//! Frame Renderer - brackets one visual frame
//!
//! ```text
//! lock ─► pointer move ─► viewport/clear ─► begin frame ─► draw state ─► engine draw ─► end frame ─► unlock ─► FPS
//!         └──────────────────────────── critical section ────────────────────────────┘
//! ```
//!
//! Pointer motion is sampled here, once per frame, instead of being forwarded
//! on every OS move event.

use std::sync::Arc;

use super::clock::{FrameClock, SystemTimeSource, TimeSource};
use super::surface::{DrawState, Rgba, VectorSurface, Viewport};
use crate::engine::Engine;

/// Window placement and scale for the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMetrics {
    /// Window origin on screen, physical pixels
    pub origin_x: f32,
    pub origin_y: f32,
    /// Logical size
    pub width: f32,
    pub height: f32,
    /// Physical pixels per logical pixel
    pub pixel_ratio: f32,
}

impl WindowMetrics {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            width,
            height,
            pixel_ratio,
        }
    }

    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.origin_x = x;
        self.origin_y = y;
        self
    }

    /// Physical viewport for this window
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width * self.pixel_ratio,
            height: self.height * self.pixel_ratio,
        }
    }

    /// Convert a physical screen position into window-local logical coordinates
    pub fn to_local(&self, screen_x: f32, screen_y: f32) -> PointerState {
        let ratio = if self.pixel_ratio > 0.0 {
            self.pixel_ratio
        } else {
            1.0
        };
        PointerState {
            x: ((screen_x - self.origin_x) / ratio).round() as i32,
            y: ((screen_y - self.origin_y) / ratio).round() as i32,
        }
    }
}

/// Last pointer position delivered to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerState {
    pub x: i32,
    pub y: i32,
}

/// Draws frames and keeps the FPS clock
pub struct FrameRenderer {
    clock: FrameClock,
    time: Arc<dyn TimeSource>,
    pointer: PointerState,
    frames_rendered: u64,
    reported_missing_surface: bool,
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self::with_time_source(Arc::new(SystemTimeSource::new()))
    }

    pub fn with_time_source(time: Arc<dyn TimeSource>) -> Self {
        let clock = FrameClock::new(time.now_ms());
        Self {
            clock,
            time,
            pointer: PointerState::default(),
            frames_rendered: 0,
            reported_missing_surface: false,
        }
    }

    /// Render one frame
    ///
    /// `screen_pointer` is the OS pointer position in physical screen pixels.
    /// Without a surface the engine still receives the pointer sample and the
    /// frame still counts; drawing is skipped and logged once.
    ///
    /// Returns the frame rate when one was published this frame.
    pub fn render_frame<E: Engine + ?Sized>(
        &mut self,
        engine: &E,
        window: &WindowMetrics,
        screen_pointer: (f32, f32),
        surface: Option<&mut dyn VectorSurface>,
    ) -> Option<f32> {
        {
            let _guard = engine.render_lock().lock();

            self.pointer = window.to_local(screen_pointer.0, screen_pointer.1);
            engine.mouse_moved(self.pointer.x, self.pointer.y);

            match surface {
                Some(surface) => {
                    surface.set_viewport(window.viewport());
                    surface.clear(Rgba::TRANSPARENT);
                    surface.begin_frame(window.width, window.height, window.pixel_ratio);
                    surface.apply_state(&DrawState::frame_default());
                    engine.draw(surface);
                    surface.end_frame();
                }
                None => {
                    if !self.reported_missing_surface {
                        log::error!("No vector surface available, skipping draw");
                        self.reported_missing_surface = true;
                    }
                }
            }
        }

        self.frames_rendered += 1;
        let fps = self.clock.record_frame(self.time.now_ms());
        if let Some(fps) = fps {
            engine.update_frame_rate(fps);
        }
        fps
    }

    pub fn pointer(&self) -> PointerState {
        self.pointer
    }

    pub fn current_fps(&self) -> f32 {
        self.clock.current_fps()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }
}

impl Default for FrameRenderer {
    fn default() -> Self {
        Self::new()
    }
}
