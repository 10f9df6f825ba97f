//! Demo engine
//!
//! A small stand-in for the synthesis engine that exercises every part of
//! the host: input metering and a test tone on the audio thread, meter
//! strips edited under the render lock, pointer crosshair, FPS readout and
//! the fatal error banner.
//!
//! Keys: `+` adds a strip, `-` removes the last one, `t` toggles the tone.
//! Right-click removes the strip under the pointer, the wheel sets the tone
//! level, dropped files become strips labelled with their file name.

use std::f32::consts::TAU;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use modhost_core::audio::{global_buffer_size, global_sample_rate, AudioBlock, MAX_INPUT_CHANNELS};
use modhost_core::render::{RenderLock, Rgba, VectorSurface};
use modhost_core::{Engine, FatalErrorState, KeyCode, PointerButton};

const METER_CHANNELS: usize = MAX_INPUT_CHANNELS as usize;
const TONE_HZ: f32 = 440.0;
const MAX_TONE_LEVEL: f32 = 0.5;
const STRIP_WIDTH: f32 = 28.0;
const STRIP_GAP: f32 = 12.0;
const STRIP_TOP: f32 = 48.0;
const METER_DECAY: f32 = 0.85;

const BACKGROUND: Rgba = Rgba::new(0.08, 0.08, 0.1, 1.0);
const METER: Rgba = Rgba::new(0.3, 0.8, 0.5, 1.0);
const METER_BED: Rgba = Rgba::new(0.18, 0.18, 0.22, 1.0);
const SELECTED: Rgba = Rgba::new(0.9, 0.7, 0.3, 1.0);
const TEXT: Rgba = Rgba::new(0.85, 0.85, 0.9, 1.0);
const CROSSHAIR: Rgba = Rgba::new(1.0, 1.0, 1.0, 0.25);
const FATAL: Rgba = Rgba::new(0.95, 0.3, 0.3, 1.0);

/// f32 stored as bits for lock-free sharing with the audio thread
#[derive(Debug, Default)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// One meter strip; strips are the engine's structural state
#[derive(Debug, Clone)]
struct Strip {
    label: String,
    channel: usize,
    level: f32,
}

#[derive(Debug, Default)]
struct UiState {
    pointer: (i32, i32),
    fps: f32,
    selected: Option<usize>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct DemoEngine {
    render_lock: RenderLock,
    fatal: FatalErrorState,
    /// Per-input-channel block peaks, written by the audio thread
    peaks: [AtomicF32; METER_CHANNELS],
    output_peak: AtomicF32,
    tone_on: AtomicBool,
    tone_level: AtomicF32,
    /// Audio-thread only
    tone_phase: AtomicF32,
    strips: Mutex<Vec<Strip>>,
    ui: Mutex<UiState>,
}

impl DemoEngine {
    pub fn new() -> Self {
        let strips = (0..2)
            .map(|channel| Strip {
                label: format!("in {}", channel + 1),
                channel,
                level: 0.0,
            })
            .collect();
        Self {
            render_lock: RenderLock::new(),
            fatal: FatalErrorState::new(),
            peaks: std::array::from_fn(|_| AtomicF32::default()),
            output_peak: AtomicF32::default(),
            tone_on: AtomicBool::new(false),
            tone_level: AtomicF32::new(0.1),
            tone_phase: AtomicF32::default(),
            strips: Mutex::new(strips),
            ui: Mutex::new(UiState::default()),
        }
    }

    /// Structural edit: holds the render lock so no frame sees a half-built strip list
    fn edit_strips(&self, edit: impl FnOnce(&mut Vec<Strip>)) {
        let _guard = self.render_lock.lock();
        edit(&mut lock(&self.strips));
    }

    fn add_strip(&self, label: Option<String>) {
        self.edit_strips(|strips| {
            let channel = strips.len() % METER_CHANNELS;
            let label = label.unwrap_or_else(|| format!("in {}", channel + 1));
            log::debug!("Adding strip '{}' on channel {}", label, channel);
            strips.push(Strip {
                label,
                channel,
                level: 0.0,
            });
        });
    }

    fn remove_strip(&self, index: usize) {
        self.edit_strips(|strips| {
            if index < strips.len() {
                let removed = strips.remove(index);
                log::debug!("Removed strip '{}'", removed.label);
            }
        });
        let mut ui = lock(&self.ui);
        if ui.selected == Some(index) {
            ui.selected = None;
        }
    }

    fn strip_at(&self, x: i32) -> Option<usize> {
        let x = x as f32 - STRIP_GAP;
        if x < 0.0 {
            return None;
        }
        let pitch = STRIP_WIDTH + STRIP_GAP;
        let index = (x / pitch) as usize;
        let within = x - index as f32 * pitch;
        let count = lock(&self.strips).len();
        (within <= STRIP_WIDTH && index < count).then_some(index)
    }

    pub fn strip_count(&self) -> usize {
        lock(&self.strips).len()
    }
}

impl Default for DemoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for DemoEngine {
    fn audio_in(&self, input: &AudioBlock) {
        for (channel, peak) in self.peaks.iter().enumerate() {
            let value = if channel < input.channels() {
                input
                    .channel(channel)
                    .iter()
                    .fold(0.0f32, |max, s| max.max(s.abs()))
            } else {
                0.0
            };
            peak.store(value);
        }
    }

    fn audio_out(&self, output: &mut AudioBlock) {
        output.fill_silence();
        if !self.tone_on.load(Ordering::Relaxed) || output.channels() == 0 {
            self.output_peak.store(0.0);
            return;
        }

        let level = self.tone_level.load();
        let step = TONE_HZ / global_sample_rate().max(1) as f32;
        let mut phase = self.tone_phase.load();
        let frames = output.frames();
        for frame in 0..frames {
            let sample = (phase * TAU).sin() * level;
            for channel in 0..output.channels() {
                output.channel_mut(channel)[frame] = sample;
            }
            phase = (phase + step).fract();
        }
        self.tone_phase.store(phase);
        self.output_peak.store(level);
    }

    fn poll(&self) {
        let mut strips = lock(&self.strips);
        for strip in strips.iter_mut() {
            let peak = self.peaks[strip.channel].load();
            strip.level = peak.max(strip.level * METER_DECAY);
        }
    }

    fn draw(&self, surface: &mut dyn VectorSurface) {
        let (width, height) = surface.frame_size();
        surface.fill_rect(0.0, 0.0, width, height, BACKGROUND);

        let ui = lock(&self.ui);
        let meter_height = (height - STRIP_TOP - 32.0).max(0.0);
        for (i, strip) in lock(&self.strips).iter().enumerate() {
            let x = STRIP_GAP + i as f32 * (STRIP_WIDTH + STRIP_GAP);
            surface.fill_rect(x, STRIP_TOP, STRIP_WIDTH, meter_height, METER_BED);
            let filled = meter_height * strip.level.clamp(0.0, 1.0);
            let color = if ui.selected == Some(i) { SELECTED } else { METER };
            surface.fill_rect(x, STRIP_TOP + meter_height - filled, STRIP_WIDTH, filled, color);
            surface.fill_text(x, STRIP_TOP + meter_height + 6.0, &strip.label, 11.0, TEXT);
        }

        let (px, py) = (ui.pointer.0 as f32, ui.pointer.1 as f32);
        surface.stroke_line((0.0, py), (width, py), 1.0, CROSSHAIR);
        surface.stroke_line((px, 0.0), (px, height), 1.0, CROSSHAIR);

        let tone = if self.tone_on.load(Ordering::Relaxed) {
            format!("tone {:.2}", self.tone_level.load())
        } else {
            "tone off".to_string()
        };
        let status = format!(
            "{:.0} fps   {} Hz / {} frames   {}",
            ui.fps,
            global_sample_rate(),
            global_buffer_size(),
            tone
        );
        surface.fill_text(STRIP_GAP, 12.0, &status, 14.0, TEXT);

        if let Some(message) = self.fatal.get() {
            for (i, line) in message.lines().enumerate() {
                surface.fill_text(STRIP_GAP, height / 2.0 + i as f32 * 18.0, line, 14.0, FATAL);
            }
        }
    }

    fn mouse_moved(&self, x: i32, y: i32) {
        lock(&self.ui).pointer = (x, y);
    }

    fn mouse_pressed(&self, x: i32, _y: i32, button: PointerButton) {
        let hit = self.strip_at(x);
        match (button, hit) {
            (PointerButton::Secondary, Some(index)) => self.remove_strip(index),
            (PointerButton::Primary, hit) => lock(&self.ui).selected = hit,
            _ => {}
        }
    }

    fn mouse_released(&self, _x: i32, _y: i32, _button: PointerButton) {}

    fn mouse_dragged(&self, x: i32, y: i32, _button: PointerButton) {
        lock(&self.ui).pointer = (x, y);
    }

    fn mouse_scrolled(&self, _dx: f32, dy: f32) {
        // dy arrives in pixels; one wheel notch is about 30
        let level = (self.tone_level.load() + dy / 3000.0).clamp(0.0, MAX_TONE_LEVEL);
        self.tone_level.store(level);
    }

    fn key_pressed(&self, code: KeyCode, is_repeat: bool) {
        match code.as_char() {
            Some('+') | Some('=') => self.add_strip(None),
            Some('-') => {
                let count = self.strip_count();
                if count > 0 {
                    self.remove_strip(count - 1);
                }
            }
            Some('t') | Some('T') if !is_repeat => {
                let on = !self.tone_on.load(Ordering::Relaxed);
                self.tone_on.store(on, Ordering::Relaxed);
                log::info!("Test tone {}", if on { "on" } else { "off" });
            }
            _ => log::trace!("Unhandled key {:?} (repeat: {})", code, is_repeat),
        }
    }

    fn key_released(&self, code: KeyCode) {
        log::trace!("Key released {:?}", code);
    }

    fn files_dropped(&self, paths: &[String], x: i32, y: i32) {
        log::info!("{} file(s) dropped at ({}, {})", paths.len(), x, y);
        for path in paths {
            let label = Path::new(path)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.clone());
            self.add_strip(Some(label));
        }
    }

    fn update_frame_rate(&self, fps: f32) {
        lock(&self.ui).fps = fps;
    }

    fn set_fatal_error(&self, message: String) {
        log::error!("Fatal: {}", message);
        self.fatal.set(message);
    }

    fn render_lock(&self) -> &RenderLock {
        &self.render_lock
    }
}
