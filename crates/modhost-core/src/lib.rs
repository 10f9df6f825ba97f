//! modhost core - real-time host shell for a modular synthesis engine
//!
//! This crate provides:
//! - Audio device negotiation against a cpal (or stub) platform
//! - The real-time audio bridge into the engine
//! - A 60 Hz render loop driver and frame renderer with FPS accounting
//! - Input normalization (key repeat, scroll scaling, file drops)
//! - The render lock serializing drawing against structural engine edits
//!
//! # Architecture
//!
//! ```text
//! cpal audio thread ─► AudioBridge ─► engine.audio_in / audio_out     (lock-free)
//! UI timer (60 Hz)  ─► RenderLoopDriver ─► engine.poll, repaint request
//! repaint           ─► FrameRenderer ─► [render lock] pointer + draw [unlock] ─► FPS
//! window events     ─► InputNormalizer ─► engine input callbacks
//! ```

pub mod audio;
pub mod config;
pub mod engine;
pub mod host;
pub mod input;
pub mod render;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{default_prefs_path, load_prefs, UserPrefs};
pub use engine::{Engine, FatalErrorState, KeyCode, PointerButton};
pub use host::Host;
