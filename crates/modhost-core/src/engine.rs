//! Engine callback surface
//!
//! The synthesis engine is external to the shell. It is shared between the
//! audio thread and the UI thread behind an `Arc`, so every entry point takes
//! `&self`; the engine owns its interior mutability.
//!
//! # Thread contract
//!
//! | Entry point                          | Thread | Render lock held |
//! |--------------------------------------|--------|------------------|
//! | `audio_in`, `audio_out`              | audio  | never            |
//! | `mouse_moved` (per-frame sample)     | UI     | yes              |
//! | `draw`                               | UI     | yes              |
//! | other input, `poll`, `update_frame_rate` | UI | no (engine locks around structural edits) |

use std::sync::OnceLock;

use crate::audio::AudioBlock;
use crate::render::{RenderLock, VectorSurface};

/// Pointer button identity
///
/// The numeric values are what engines historically expect: primary = 1,
/// secondary = 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PointerButton {
    Primary = 1,
    Secondary = 2,
}

impl PointerButton {
    /// Numeric button id (1 = primary, 2 = secondary)
    pub fn id(self) -> u8 {
        self as u8
    }
}

/// Resolved key identity: a printable character when one exists, else a raw
/// platform key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub fn from_char(c: char) -> Self {
        KeyCode(c as u32)
    }

    /// The printable character, if this code is one
    pub fn as_char(self) -> Option<char> {
        char::from_u32(self.0).filter(|c| !c.is_control())
    }
}

/// The engine the shell drives
pub trait Engine: Send + Sync + 'static {
    /// Ingest one block of hardware input (audio thread, must not block)
    fn audio_in(&self, input: &AudioBlock);

    /// Fill one block of hardware output (audio thread, must not block)
    fn audio_out(&self, output: &mut AudioBlock);

    /// Advance time-based state independent of the audio cadence
    fn poll(&self);

    /// Draw the current state into the open vector frame
    fn draw(&self, surface: &mut dyn VectorSurface);

    fn mouse_moved(&self, x: i32, y: i32);

    fn mouse_pressed(&self, x: i32, y: i32, button: PointerButton);

    fn mouse_released(&self, x: i32, y: i32, button: PointerButton);

    fn mouse_dragged(&self, x: i32, y: i32, button: PointerButton);

    fn mouse_scrolled(&self, dx: f32, dy: f32);

    fn key_pressed(&self, code: KeyCode, is_repeat: bool);

    fn key_released(&self, code: KeyCode);

    /// Absolute paths dropped onto the window at (x, y)
    fn files_dropped(&self, paths: &[String], x: i32, y: i32);

    /// Measured frames per second, published about once a second
    fn update_frame_rate(&self, fps: f32);

    /// Report a terminal condition; the engine decides how to display it
    fn set_fatal_error(&self, message: String);

    /// The lock serializing frame drawing against structural edits
    fn render_lock(&self) -> &RenderLock;
}

/// Write-once fatal error message
///
/// The first message wins; later ones are logged and dropped.
#[derive(Debug, Default)]
pub struct FatalErrorState {
    message: OnceLock<String>,
}

impl FatalErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the message; returns false if one was already set
    pub fn set(&self, message: String) -> bool {
        match self.message.set(message) {
            Ok(()) => true,
            Err(dropped) => {
                log::warn!("Fatal error already set, ignoring: {}", dropped);
                false
            }
        }
    }

    pub fn get(&self) -> Option<&str> {
        self.message.get().map(String::as_str)
    }

    pub fn is_set(&self) -> bool {
        self.message.get().is_some()
    }
}
