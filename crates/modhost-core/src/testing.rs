//! Test doubles for the shell's collaborators

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::audio::{
    AudioBlock, AudioIoCallback, AudioPlatform, DeviceSetup, PlatformError, ResolvedDeviceConfig,
};
use crate::engine::{Engine, FatalErrorState, KeyCode, PointerButton};
use crate::input::KeyStateQuery;
use crate::render::{
    FocusControl, LineCap, LineJoin, RenderLock, RepaintScheduler, Rgba, VectorSurface, Viewport,
};

/// One call into the engine surface
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    AudioIn { frames: usize, channels: usize },
    AudioOut { frames: usize, channels: usize },
    Poll,
    Draw { locked: bool },
    MouseMoved { x: i32, y: i32, locked: bool },
    MousePressed { x: i32, y: i32, button: PointerButton },
    MouseReleased { x: i32, y: i32, button: PointerButton },
    MouseDragged { x: i32, y: i32, button: PointerButton },
    MouseScrolled { dx: f32, dy: f32 },
    KeyPressed { code: KeyCode, is_repeat: bool },
    KeyReleased { code: KeyCode },
    FilesDropped { paths: Vec<String>, x: i32, y: i32 },
    UpdateFrameRate { fps: f32, locked: bool },
    FatalError(String),
}

/// Engine that records every call and checks render-lock discipline
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    lock: RenderLock,
    fatal: FatalErrorState,
    modules: Mutex<Vec<u32>>,
    editing: AtomicBool,
    drawing: AtomicBool,
    violations: AtomicUsize,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fatal_error(&self) -> Option<String> {
        self.fatal.get().map(str::to_string)
    }

    /// Add a module the way a UI-thread structural edit would
    pub fn structural_edit(&self, id: u32) {
        let _guard = self.lock.lock();
        self.editing.store(true, Ordering::SeqCst);
        if self.drawing.load(Ordering::SeqCst) {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        self.modules.lock().unwrap().push(id);
        for _ in 0..64 {
            std::hint::spin_loop();
        }
        self.editing.store(false, Ordering::SeqCst);
    }

    /// Draws that ran unlocked or overlapped an edit
    pub fn overlap_violations(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Engine for RecordingEngine {
    fn audio_in(&self, input: &AudioBlock) {
        self.record(EngineCall::AudioIn {
            frames: input.frames(),
            channels: input.channels(),
        });
    }

    fn audio_out(&self, output: &mut AudioBlock) {
        self.record(EngineCall::AudioOut {
            frames: output.frames(),
            channels: output.channels(),
        });
    }

    fn poll(&self) {
        self.record(EngineCall::Poll);
    }

    fn draw(&self, surface: &mut dyn VectorSurface) {
        let locked = self.lock.is_locked();
        self.drawing.store(true, Ordering::SeqCst);
        if !locked || self.editing.load(Ordering::SeqCst) {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        surface.fill_text(0.0, 0.0, "engine", 12.0, Rgba::WHITE);
        self.drawing.store(false, Ordering::SeqCst);
        self.record(EngineCall::Draw { locked });
    }

    fn mouse_moved(&self, x: i32, y: i32) {
        let locked = self.lock.is_locked();
        self.record(EngineCall::MouseMoved { x, y, locked });
    }

    fn mouse_pressed(&self, x: i32, y: i32, button: PointerButton) {
        self.record(EngineCall::MousePressed { x, y, button });
    }

    fn mouse_released(&self, x: i32, y: i32, button: PointerButton) {
        self.record(EngineCall::MouseReleased { x, y, button });
    }

    fn mouse_dragged(&self, x: i32, y: i32, button: PointerButton) {
        self.record(EngineCall::MouseDragged { x, y, button });
    }

    fn mouse_scrolled(&self, dx: f32, dy: f32) {
        self.record(EngineCall::MouseScrolled { dx, dy });
    }

    fn key_pressed(&self, code: KeyCode, is_repeat: bool) {
        self.record(EngineCall::KeyPressed { code, is_repeat });
    }

    fn key_released(&self, code: KeyCode) {
        self.record(EngineCall::KeyReleased { code });
    }

    fn files_dropped(&self, paths: &[String], x: i32, y: i32) {
        self.record(EngineCall::FilesDropped {
            paths: paths.to_vec(),
            x,
            y,
        });
    }

    fn update_frame_rate(&self, fps: f32) {
        let locked = self.lock.is_locked();
        self.record(EngineCall::UpdateFrameRate { fps, locked });
    }

    fn set_fatal_error(&self, message: String) {
        self.fatal.set(message.clone());
        self.record(EngineCall::FatalError(message));
    }

    fn render_lock(&self) -> &RenderLock {
        &self.lock
    }
}

/// Callback that does nothing
pub struct NullCallback;

impl AudioIoCallback for NullCallback {
    fn process(&self, _input: &AudioBlock, _output: &mut AudioBlock) {}
}

/// Platform lifecycle events in call order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    Initialise,
    AddCallback,
    RemoveCallback,
    CloseDevice,
}

/// In-memory audio platform granting a fixed configuration
#[derive(Default)]
pub struct StubPlatform {
    grant: ResolvedDeviceConfig,
    failure: Option<PlatformError>,
    last_setup: Option<DeviceSetup>,
    ceilings: Option<(u16, u16)>,
    callback: Option<Arc<dyn AudioIoCallback>>,
    add_callback_calls: usize,
    pub events: Vec<PlatformEvent>,
}

impl StubPlatform {
    pub fn granting(grant: ResolvedDeviceConfig) -> Self {
        Self {
            grant,
            ..Self::default()
        }
    }

    pub fn failing(error: PlatformError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn last_setup(&self) -> Option<&DeviceSetup> {
        self.last_setup.as_ref()
    }

    pub fn channel_ceilings(&self) -> Option<(u16, u16)> {
        self.ceilings
    }

    pub fn add_callback_calls(&self) -> usize {
        self.add_callback_calls
    }

    /// Run one block through the registered callback, as the audio thread would
    pub fn pump(&self, frames: usize) -> bool {
        let Some(callback) = &self.callback else {
            return false;
        };
        let mut input = AudioBlock::new(self.grant.input_channels as usize, frames);
        input.set_frames(frames);
        let mut output = AudioBlock::new(self.grant.output_channels as usize, frames);
        output.set_frames(frames);
        callback.process(&input, &mut output);
        true
    }
}

impl AudioPlatform for StubPlatform {
    fn initialise(
        &mut self,
        setup: &DeviceSetup,
        max_input_channels: u16,
        max_output_channels: u16,
    ) -> Result<(), PlatformError> {
        self.events.push(PlatformEvent::Initialise);
        self.last_setup = Some(setup.clone());
        self.ceilings = Some((max_input_channels, max_output_channels));
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn current_setup(&self) -> ResolvedDeviceConfig {
        self.grant.clone()
    }

    fn add_callback(&mut self, callback: Arc<dyn AudioIoCallback>) -> Result<(), PlatformError> {
        self.events.push(PlatformEvent::AddCallback);
        self.add_callback_calls += 1;
        callback.about_to_start(&self.grant);
        self.callback = Some(callback);
        Ok(())
    }

    fn remove_callback(&mut self) {
        self.events.push(PlatformEvent::RemoveCallback);
        if let Some(callback) = self.callback.take() {
            callback.stopped();
        }
    }

    fn close_device(&mut self) {
        self.events.push(PlatformEvent::CloseDevice);
    }

    fn has_callback(&self) -> bool {
        self.callback.is_some()
    }
}

/// Window focus stand-in
#[derive(Debug, Default)]
pub struct StubFocus {
    pub focused: bool,
    pub visible: bool,
    pub grabs: usize,
}

impl StubFocus {
    pub fn visible() -> Self {
        Self {
            visible: true,
            ..Self::default()
        }
    }

    pub fn hidden() -> Self {
        Self::default()
    }
}

impl FocusControl for StubFocus {
    fn has_keyboard_focus(&self) -> bool {
        self.focused
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn grab_keyboard_focus(&mut self) {
        self.grabs += 1;
        self.focused = true;
    }
}

#[derive(Debug, Default)]
pub struct StubRepaint {
    pub requests: usize,
}

impl RepaintScheduler for StubRepaint {
    fn request_repaint(&mut self) {
        self.requests += 1;
    }
}

/// Hardware key state stand-in
#[derive(Debug, Default)]
pub struct HeldKeys {
    down: HashSet<KeyCode>,
}

impl HeldKeys {
    pub fn press(&mut self, code: KeyCode) {
        self.down.insert(code);
    }

    pub fn release(&mut self, code: KeyCode) {
        self.down.remove(&code);
    }
}

impl KeyStateQuery for HeldKeys {
    fn is_key_down(&self, code: KeyCode) -> bool {
        self.down.contains(&code)
    }
}

/// A recorded surface call
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    Viewport(f32, f32),
    Clear(Rgba),
    BeginFrame(f32, f32, f32),
    EndFrame,
    LineCap(LineCap),
    LineJoin(LineJoin),
    LetterSpacing(f32),
    Rect,
    Line,
    Text(String),
}

/// Vector surface that records calls instead of drawing
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<SurfaceOp>,
    size: (f32, f32),
}

impl VectorSurface for RecordingSurface {
    fn set_viewport(&mut self, viewport: Viewport) {
        self.ops.push(SurfaceOp::Viewport(viewport.width, viewport.height));
    }

    fn clear(&mut self, color: Rgba) {
        self.ops.push(SurfaceOp::Clear(color));
    }

    fn begin_frame(&mut self, width: f32, height: f32, pixel_ratio: f32) {
        self.size = (width, height);
        self.ops.push(SurfaceOp::BeginFrame(width, height, pixel_ratio));
    }

    fn end_frame(&mut self) {
        self.ops.push(SurfaceOp::EndFrame);
    }

    fn frame_size(&self) -> (f32, f32) {
        self.size
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.ops.push(SurfaceOp::LineCap(cap));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.ops.push(SurfaceOp::LineJoin(join));
    }

    fn set_letter_spacing(&mut self, spacing: f32) {
        self.ops.push(SurfaceOp::LetterSpacing(spacing));
    }

    fn fill_rect(&mut self, _x: f32, _y: f32, _width: f32, _height: f32, _color: Rgba) {
        self.ops.push(SurfaceOp::Rect);
    }

    fn stroke_line(&mut self, _from: (f32, f32), _to: (f32, f32), _width: f32, _color: Rgba) {
        self.ops.push(SurfaceOp::Line);
    }

    fn fill_text(&mut self, _x: f32, _y: f32, text: &str, _size: f32, _color: Rgba) {
        self.ops.push(SurfaceOp::Text(text.to_string()));
    }
}
