//! Vector drawing surface
//!
//! The shell only brackets frames; primitive rendering belongs to whatever
//! backend implements `VectorSurface` (an iced canvas frame in the app, an
//! in-memory recorder in tests). The small primitive set exists so engines
//! have something to draw with.

/// Stroke end cap style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

/// Stroke corner join style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// RGBA color with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Physical-pixel viewport of the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// Global draw state applied once per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawState {
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    /// Letter spacing in logical pixels (negative tightens)
    pub letter_spacing: f32,
}

/// Letter spacing every frame starts with
pub const FRAME_LETTER_SPACING: f32 = -0.3;

impl DrawState {
    /// The state configured at the start of every frame
    pub fn frame_default() -> Self {
        Self {
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            letter_spacing: FRAME_LETTER_SPACING,
        }
    }
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            letter_spacing: 0.0,
        }
    }
}

/// Frame-bracketing vector drawing API
///
/// Call order per frame: `set_viewport` → `clear` → `begin_frame` → state
/// setters → engine primitives → `end_frame`.
pub trait VectorSurface {
    /// Size the physical-pixel viewport
    fn set_viewport(&mut self, viewport: Viewport);

    /// Clear color, depth and stencil to the given color
    fn clear(&mut self, color: Rgba);

    /// Start a vector frame at logical size and pixel ratio
    fn begin_frame(&mut self, width: f32, height: f32, pixel_ratio: f32);

    /// Finish the vector frame and flush it
    fn end_frame(&mut self);

    /// Logical size passed to the open frame's `begin_frame`
    fn frame_size(&self) -> (f32, f32);

    fn set_line_cap(&mut self, cap: LineCap);

    fn set_line_join(&mut self, join: LineJoin);

    fn set_letter_spacing(&mut self, spacing: f32);

    /// Fill an axis-aligned rectangle (logical coordinates)
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba);

    /// Stroke a straight segment with the current cap/join
    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgba);

    /// Draw text with its top-left at (x, y)
    fn fill_text(&mut self, x: f32, y: f32, text: &str, size: f32, color: Rgba);

    /// Apply a whole draw state
    fn apply_state(&mut self, state: &DrawState) {
        self.set_line_cap(state.line_cap);
        self.set_line_join(state.line_join);
        self.set_letter_spacing(state.letter_spacing);
    }
}
