//! iced window layer
//!
//! Feeds window events and the 60 Hz timer into the host, and draws engine
//! frames onto an iced canvas.

pub mod app;
mod canvas;
mod keys;

pub use app::{Message, ModHostApp};
