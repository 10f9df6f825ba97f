//! Render Loop Driver - the 60 Hz UI tick
//!
//! Each tick: claim keyboard focus (once per driver lifetime), poll the
//! engine, schedule a repaint. Missed ticks are not compensated.

use std::time::Duration;

use crate::engine::Engine;

/// Tick rate of the render loop
pub const TICK_HZ: u32 = 60;

/// Tick period for a `TICK_HZ` timer
pub fn tick_interval() -> Duration {
    Duration::from_micros(1_000_000 / TICK_HZ as u64)
}

/// Window focus queries and requests
pub trait FocusControl {
    fn has_keyboard_focus(&self) -> bool;
    fn is_visible(&self) -> bool;
    fn grab_keyboard_focus(&mut self);
}

/// Schedules a repaint without drawing synchronously
pub trait RepaintScheduler {
    fn request_repaint(&mut self);
}

/// Drives polling and repaint scheduling
#[derive(Debug, Default)]
pub struct RenderLoopDriver {
    has_grabbed_focus: bool,
    ticks: u64,
}

impl RenderLoopDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// One timer tick
    pub fn tick<E: Engine + ?Sized>(
        &mut self,
        engine: &E,
        focus: &mut dyn FocusControl,
        repaint: &mut dyn RepaintScheduler,
    ) {
        self.claim_focus_once(focus);
        engine.poll();
        repaint.request_repaint();
        self.ticks += 1;
    }

    /// Grab focus if we never have and the window is visible without it
    pub fn claim_focus_once(&mut self, focus: &mut dyn FocusControl) {
        if !self.has_grabbed_focus && !focus.has_keyboard_focus() && focus.is_visible() {
            log::debug!("Claiming keyboard focus");
            focus.grab_keyboard_focus();
            self.has_grabbed_focus = true;
        }
    }

    pub fn has_grabbed_focus(&self) -> bool {
        self.has_grabbed_focus
    }

    /// Ticks processed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, RecordingEngine, StubFocus, StubRepaint};

    #[test]
    fn test_tick_polls_then_requests_repaint() {
        let engine = RecordingEngine::new();
        let mut focus = StubFocus::visible();
        let mut repaint = StubRepaint::default();
        let mut driver = RenderLoopDriver::new();

        driver.tick(&engine, &mut focus, &mut repaint);

        assert_eq!(engine.calls(), vec![EngineCall::Poll]);
        assert_eq!(repaint.requests, 1);
        assert_eq!(driver.ticks(), 1);
    }

    #[test]
    fn test_focus_grabbed_once_then_never_again() {
        let engine = RecordingEngine::new();
        let mut focus = StubFocus::visible();
        let mut repaint = StubRepaint::default();
        let mut driver = RenderLoopDriver::new();

        for _ in 0..5 {
            driver.tick(&engine, &mut focus, &mut repaint);
        }
        // Focus lost later; the claim is one-shot
        focus.focused = false;
        for _ in 0..5 {
            driver.tick(&engine, &mut focus, &mut repaint);
        }

        assert_eq!(focus.grabs, 1);
        assert!(driver.has_grabbed_focus());
        assert_eq!(repaint.requests, 10);
    }

    #[test]
    fn test_no_grab_while_focus_already_held() {
        let engine = RecordingEngine::new();
        let mut focus = StubFocus::visible();
        focus.focused = true;
        let mut repaint = StubRepaint::default();
        let mut driver = RenderLoopDriver::new();

        for _ in 0..10 {
            driver.tick(&engine, &mut focus, &mut repaint);
        }

        assert_eq!(focus.grabs, 0);
    }

    #[test]
    fn test_hidden_window_waits_for_visibility() {
        let engine = RecordingEngine::new();
        let mut focus = StubFocus::hidden();
        let mut repaint = StubRepaint::default();
        let mut driver = RenderLoopDriver::new();

        driver.tick(&engine, &mut focus, &mut repaint);
        assert_eq!(focus.grabs, 0);

        focus.visible = true;
        driver.tick(&engine, &mut focus, &mut repaint);
        driver.tick(&engine, &mut focus, &mut repaint);
        assert_eq!(focus.grabs, 1);
    }

    #[test]
    fn test_tick_interval_is_sixty_hz() {
        assert_eq!(tick_interval(), Duration::from_micros(16_666));
    }
}
