//! Main application state and message routing

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::Arc;

use iced::widget::canvas::{Cache, Canvas};
use iced::{event, keyboard, mouse, time, window, Element, Event, Length, Point, Subscription, Task};
use modhost_core::audio::{CpalPlatform, DeviceConfig};
use modhost_core::input::{RawButton, ScrollEvent, SCROLL_MULTIPLIER};
use modhost_core::render::{tick_interval, FocusControl, RepaintScheduler};
use modhost_core::{Host, UserPrefs};

use super::canvas::{AppHost, EngineCanvas};
use super::keys::{HeldKeys, KeyCodes};
use crate::demo::DemoEngine;

/// Messages handled by the application
#[derive(Debug, Clone)]
pub enum Message {
    /// 60 Hz timer tick
    Tick,
    /// Window, keyboard or mouse event for the given window
    Event(window::Id, Event),
    /// Display scale factor reported for the window
    ScaleFactor(f32),
}

#[derive(Debug, Default)]
struct WindowState {
    id: Option<window::Id>,
    focused: bool,
    visible: bool,
}

/// Focus view handed to the render loop driver for one tick
struct TickFocus<'a> {
    window: &'a WindowState,
    grab_requested: bool,
}

impl FocusControl for TickFocus<'_> {
    fn has_keyboard_focus(&self) -> bool {
        self.window.focused || self.grab_requested
    }

    fn is_visible(&self) -> bool {
        self.window.visible
    }

    fn grab_keyboard_focus(&mut self) {
        self.grab_requested = true;
    }
}

/// Repaint requests invalidate the canvas cache; iced redraws after the update
struct CacheRepaint<'a> {
    cache: &'a Cache,
}

impl RepaintScheduler for CacheRepaint<'_> {
    fn request_repaint(&mut self) {
        self.cache.clear();
    }
}

fn raw_button(button: mouse::Button) -> RawButton {
    match button {
        mouse::Button::Left => RawButton::Left,
        mouse::Button::Right => RawButton::Right,
        mouse::Button::Middle => RawButton::Middle,
        mouse::Button::Back => RawButton::Other(3),
        mouse::Button::Forward => RawButton::Other(4),
        mouse::Button::Other(id) => RawButton::Other(id),
    }
}

/// Main application
pub struct ModHostApp {
    host: RefCell<AppHost>,
    cache: Cache,
    prefs: UserPrefs,
    pixel_ratio: f32,
    window: WindowState,
    /// Last cursor position, window-local logical pixels
    cursor: Point,
    held_button: Option<RawButton>,
    held_keys: HeldKeys,
    key_codes: KeyCodes,
    /// Dropped files are batched until the next tick
    pending_drops: Vec<PathBuf>,
}

impl ModHostApp {
    /// Build the host and start audio from the user's preferences
    pub fn new(prefs: &UserPrefs) -> (Self, Task<Message>) {
        let engine = Arc::new(DemoEngine::new());
        let mut host = Host::new(engine, CpalPlatform::new());

        if let Some(resolved) = host.start_audio(&DeviceConfig::from_prefs(prefs)) {
            log::info!(
                "Audio running: {} Hz, {} frames ({:.1} ms)",
                resolved.sample_rate,
                resolved.buffer_size,
                resolved.latency_ms()
            );
        }

        // Replaced once the window reports its display scale
        let pixel_ratio = prefs.effective_pixel_ratio(1.0);

        let app = Self {
            host: RefCell::new(host),
            cache: Cache::new(),
            prefs: prefs.clone(),
            pixel_ratio,
            window: WindowState::default(),
            cursor: Point::ORIGIN,
            held_button: None,
            held_keys: HeldKeys::default(),
            key_codes: KeyCodes::default(),
            pending_drops: Vec::new(),
        };
        (app, Task::none())
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => self.on_tick(),
            Message::Event(id, event) => {
                self.window.id.get_or_insert(id);
                match event {
                    Event::Window(event) => return self.on_window_event(id, event),
                    Event::Keyboard(event) => self.on_keyboard_event(event),
                    Event::Mouse(event) => self.on_mouse_event(event),
                    _ => {}
                }
                Task::none()
            }
            Message::ScaleFactor(scale) => {
                self.set_display_scale(scale);
                Task::none()
            }
        }
    }

    fn set_display_scale(&mut self, scale: f32) {
        let ratio = self.prefs.effective_pixel_ratio(scale);
        if ratio != self.pixel_ratio {
            log::info!("Pixel ratio: {} (display scale {})", ratio, scale);
            self.pixel_ratio = ratio;
            self.cache.clear();
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        Canvas::new(EngineCanvas {
            host: &self.host,
            cache: &self.cache,
            pixel_ratio: self.pixel_ratio,
        })
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            time::every(tick_interval()).map(|_| Message::Tick),
            event::listen_with(|event, _status, id| match event {
                Event::Window(_) | Event::Keyboard(_) | Event::Mouse(_) => {
                    Some(Message::Event(id, event))
                }
                _ => None,
            }),
        ])
    }

    fn on_tick(&mut self) -> Task<Message> {
        self.flush_drops();

        let mut focus = TickFocus {
            window: &self.window,
            grab_requested: false,
        };
        let mut repaint = CacheRepaint { cache: &self.cache };
        self.host.get_mut().tick(&mut focus, &mut repaint);

        match (focus.grab_requested, self.window.id) {
            (true, Some(id)) => {
                log::debug!("Grabbing keyboard focus");
                window::gain_focus(id)
            }
            _ => Task::none(),
        }
    }

    fn flush_drops(&mut self) {
        if self.pending_drops.is_empty() {
            return;
        }
        let paths = std::mem::take(&mut self.pending_drops);
        let (x, y) = self.pointer_xy();
        self.host.get_mut().files_dropped(&paths, x, y);
    }

    fn pointer_xy(&self) -> (i32, i32) {
        (self.cursor.x.round() as i32, self.cursor.y.round() as i32)
    }

    fn on_window_event(&mut self, id: window::Id, event: window::Event) -> Task<Message> {
        let host = self.host.get_mut();
        match event {
            // The window may have moved to a display with another scale
            window::Event::Opened { .. } | window::Event::Resized(_) => {
                self.window.visible = true;
                return window::scale_factor(id).map(Message::ScaleFactor);
            }
            window::Event::Focused => {
                self.window.focused = true;
                self.window.visible = true;
            }
            window::Event::Unfocused => self.window.focused = false,
            window::Event::FileHovered(path) => {
                if !host.is_interested_in_file_drag(std::slice::from_ref(&path)) {
                    log::debug!("Ignoring drag of {}", path.display());
                }
            }
            window::Event::FileDropped(path) => self.pending_drops.push(path),
            window::Event::Closed => host.shutdown(),
            _ => {}
        }
        Task::none()
    }

    fn on_keyboard_event(&mut self, event: keyboard::Event) {
        let host = self.host.get_mut();
        match event {
            keyboard::Event::KeyPressed {
                physical_key, text, ..
            } => {
                let press = self.key_codes.raw_press(&physical_key, text.as_deref());
                self.held_keys.press(physical_key, press.resolve());
                host.key_pressed(press);
            }
            keyboard::Event::KeyReleased { physical_key, .. } => {
                self.held_keys.release(&physical_key);
                host.key_state_changed(false, &self.held_keys);
            }
            _ => {}
        }
    }

    fn on_mouse_event(&mut self, event: mouse::Event) {
        match event {
            mouse::Event::CursorMoved { position } => {
                self.cursor = position;
                let (x, y) = self.pointer_xy();
                let host = self.host.get_mut();
                match self.held_button {
                    Some(button) => host.mouse_dragged(x, y, button),
                    None => host.pointer_moved(x, y),
                }
            }
            mouse::Event::ButtonPressed(button) => {
                let button = raw_button(button);
                let (x, y) = self.pointer_xy();
                self.held_button = Some(button);
                self.host.get_mut().mouse_pressed(x, y, button);
            }
            mouse::Event::ButtonReleased(button) => {
                let button = raw_button(button);
                let (x, y) = self.pointer_xy();
                if self.held_button == Some(button) {
                    self.held_button = None;
                }
                self.host.get_mut().mouse_released(x, y, button);
            }
            mouse::Event::WheelScrolled { delta } => {
                // Pixel deltas are rescaled so the engine sees them unchanged
                let (dx, dy) = match delta {
                    mouse::ScrollDelta::Lines { x, y } => (x, y),
                    mouse::ScrollDelta::Pixels { x, y } => {
                        (x / SCROLL_MULTIPLIER, y / SCROLL_MULTIPLIER)
                    }
                };
                self.host.get_mut().mouse_scrolled(ScrollEvent {
                    dx,
                    dy,
                    inertial: false,
                });
            }
            _ => {}
        }
    }
}
