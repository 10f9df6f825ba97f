//! Input Event Normalizer
//!
//! Turns raw window events into the engine's input surface:
//!
//! - Key presses resolve to the printable character when there is one, else
//!   the raw key code. A code already held is re-sent as a repeat.
//! - A "some key went up" notification releases the first held code whose
//!   hardware state reads up, and only that one.
//! - Pointer buttons map right → secondary, everything else → primary.
//! - Scroll deltas are scaled by `SCROLL_MULTIPLIER`; inertial scrolls are dropped.
//! - Pointer motion is NOT forwarded here; the frame renderer samples it.
//!
//! Everything runs on the UI thread, outside the render lock.

use std::path::{Path, PathBuf};

use crate::engine::{Engine, KeyCode, PointerButton};

/// Scale applied to raw scroll deltas
pub const SCROLL_MULTIPLIER: f32 = 30.0;

/// A key press as the window system reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyPress {
    /// Platform key code
    pub key_code: u32,
    /// Text the key produces, if any
    pub text: Option<char>,
}

impl RawKeyPress {
    /// Printable character if present and non-zero, else the raw key code
    pub fn resolve(&self) -> KeyCode {
        match self.text {
            Some(c) if c != '\0' => KeyCode::from_char(c),
            _ => KeyCode(self.key_code),
        }
    }
}

/// Pointer buttons as the window system reports them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

impl From<RawButton> for PointerButton {
    fn from(button: RawButton) -> Self {
        match button {
            RawButton::Right => PointerButton::Secondary,
            _ => PointerButton::Primary,
        }
    }
}

/// A wheel / trackpad scroll
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollEvent {
    pub dx: f32,
    pub dy: f32,
    /// Momentum scrolling generated after the user let go
    pub inertial: bool,
}

/// Current hardware key state
pub trait KeyStateQuery {
    fn is_key_down(&self, code: KeyCode) -> bool;
}

/// Key repeat tracking and event forwarding
#[derive(Debug, Default)]
pub struct InputNormalizer {
    /// Held codes in press order
    pressed: Vec<KeyCode>,
}

impl InputNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a key press; returns true (always consumed)
    pub fn key_pressed<E: Engine + ?Sized>(&mut self, engine: &E, key: RawKeyPress) -> bool {
        let code = key.resolve();
        let is_repeat = self.pressed.contains(&code);
        if !is_repeat {
            self.pressed.push(code);
        }
        engine.key_pressed(code, is_repeat);
        true
    }

    /// Handle a key state change notification
    ///
    /// Only `is_key_down == false` notifications release anything, and at most
    /// one key per notification.
    pub fn key_state_changed<E: Engine + ?Sized>(
        &mut self,
        engine: &E,
        is_key_down: bool,
        keys: &dyn KeyStateQuery,
    ) -> bool {
        if is_key_down {
            return true;
        }
        if let Some(index) = self.pressed.iter().position(|&code| !keys.is_key_down(code)) {
            let code = self.pressed.remove(index);
            engine.key_released(code);
        }
        true
    }

    pub fn mouse_pressed<E: Engine + ?Sized>(&self, engine: &E, x: i32, y: i32, button: RawButton) {
        engine.mouse_pressed(x, y, button.into());
    }

    pub fn mouse_released<E: Engine + ?Sized>(&self, engine: &E, x: i32, y: i32, button: RawButton) {
        engine.mouse_released(x, y, button.into());
    }

    pub fn mouse_dragged<E: Engine + ?Sized>(&self, engine: &E, x: i32, y: i32, button: RawButton) {
        engine.mouse_dragged(x, y, button.into());
    }

    /// Raw pointer motion is intentionally ignored
    pub fn pointer_moved(&self, _x: i32, _y: i32) {}

    /// Forward a genuine scroll, scaled; returns whether it was forwarded
    pub fn mouse_scrolled<E: Engine + ?Sized>(&self, engine: &E, scroll: ScrollEvent) -> bool {
        if scroll.inertial {
            return false;
        }
        engine.mouse_scrolled(scroll.dx * SCROLL_MULTIPLIER, scroll.dy * SCROLL_MULTIPLIER);
        true
    }

    /// Every drag is accepted
    pub fn is_interested_in_file_drag(&self, _paths: &[PathBuf]) -> bool {
        true
    }

    /// Forward dropped files as absolute path strings
    pub fn files_dropped<E: Engine + ?Sized>(&self, engine: &E, paths: &[PathBuf], x: i32, y: i32) {
        let paths: Vec<String> = paths.iter().map(|p| absolute_path_string(p)).collect();
        engine.files_dropped(&paths, x, y);
    }

    /// Codes currently tracked as held, in press order
    pub fn pressed_keys(&self) -> &[KeyCode] {
        &self.pressed
    }
}

fn absolute_path_string(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}
