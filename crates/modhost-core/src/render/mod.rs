//! Render side of the shell: the 60 Hz driver, frame bracketing, FPS clock
//! and the render lock

mod clock;
mod driver;
mod frame;
mod lock;
mod surface;

pub use clock::{FrameClock, ManualTimeSource, SystemTimeSource, TimeSource, FPS_SAMPLE_INTERVAL_MS};
pub use driver::{tick_interval, FocusControl, RenderLoopDriver, RepaintScheduler, TICK_HZ};
pub use frame::{FrameRenderer, PointerState, WindowMetrics};
pub use lock::{RenderGuard, RenderLock};
pub use surface::{
    DrawState, LineCap, LineJoin, Rgba, VectorSurface, Viewport, FRAME_LETTER_SPACING,
};
