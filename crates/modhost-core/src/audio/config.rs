//! Audio device configuration
//!
//! Defines what the shell asks the audio hardware for (`DeviceConfig`), the
//! descriptor handed to the platform layer (`DeviceSetup`), and what the
//! platform actually granted (`ResolvedDeviceConfig`).

use serde::{Deserialize, Serialize};

use crate::config::UserPrefs;

/// Device name sentinel meaning "use the platform default device"
pub const AUTO_DEVICE: &str = "auto";

/// Hard ceiling on input channels requested from the platform
pub const MAX_INPUT_CHANNELS: u16 = 16;

/// Hard ceiling on output channels requested from the platform
pub const MAX_OUTPUT_CHANNELS: u16 = 16;

/// Compiled-in sample rate used when preferences don't name one (48kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Compiled-in buffer size used when preferences don't name one (frames)
/// 256 frames @ 48kHz = ~5.3ms
pub const DEFAULT_BUFFER_SIZE: u32 = 256;

/// Maximum block size the platform layer pre-allocates for (frames)
pub const MAX_BUFFER_SIZE: usize = 8192;

/// Requested audio hardware configuration
///
/// Produced by merging persisted preferences with compiled-in defaults.
/// Immutable once applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Preferred sample rate in Hz
    pub sample_rate: u32,
    /// Preferred buffer size in frames
    pub buffer_size: u32,
    /// Output device name, or `"auto"` for the platform default
    pub output_device_name: String,
    /// Input device name, or `"auto"` for the platform default
    pub input_device_name: String,
    /// Ceiling on input channels
    pub max_input_channels: u16,
    /// Ceiling on output channels
    pub max_output_channels: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            output_device_name: AUTO_DEVICE.to_string(),
            input_device_name: AUTO_DEVICE.to_string(),
            max_input_channels: MAX_INPUT_CHANNELS,
            max_output_channels: MAX_OUTPUT_CHANNELS,
        }
    }
}

impl DeviceConfig {
    /// Merge a preference snapshot over the compiled-in defaults
    ///
    /// Empty device names and zero rates/sizes fall back to the defaults.
    pub fn from_prefs(prefs: &UserPrefs) -> Self {
        let defaults = Self::default();
        let name_or_auto = |name: &str| {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                AUTO_DEVICE.to_string()
            } else {
                trimmed.to_string()
            }
        };

        Self {
            sample_rate: if prefs.sample_rate > 0 {
                prefs.sample_rate
            } else {
                defaults.sample_rate
            },
            buffer_size: if prefs.buffer_size > 0 {
                prefs.buffer_size
            } else {
                defaults.buffer_size
            },
            output_device_name: name_or_auto(&prefs.audio_output_device),
            input_device_name: name_or_auto(&prefs.audio_input_device),
            ..defaults
        }
    }

    /// Set a concrete output device
    pub fn with_output_device(mut self, name: impl Into<String>) -> Self {
        self.output_device_name = name.into();
        self
    }

    /// Set a concrete input device
    pub fn with_input_device(mut self, name: impl Into<String>) -> Self {
        self.input_device_name = name.into();
        self
    }

    /// Set the preferred sample rate
    pub fn with_sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    /// Set the preferred buffer size in frames
    pub fn with_buffer_size(mut self, frames: u32) -> Self {
        self.buffer_size = frames;
        self
    }

    /// The concrete output device name, `None` when `"auto"`
    pub fn requested_output(&self) -> Option<&str> {
        concrete_name(&self.output_device_name)
    }

    /// The concrete input device name, `None` when `"auto"`
    pub fn requested_input(&self) -> Option<&str> {
        concrete_name(&self.input_device_name)
    }

    /// Build the preferred-setup descriptor handed to the platform
    ///
    /// Device names are omitted when `"auto"` so the platform default is used.
    pub fn preferred_setup(&self) -> DeviceSetup {
        DeviceSetup {
            sample_rate: self.sample_rate,
            buffer_size: self.buffer_size,
            output_device_name: self.requested_output().map(str::to_string),
            input_device_name: self.requested_input().map(str::to_string),
        }
    }

    /// Latency of the requested buffer in milliseconds
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate.max(1) as f32) * 1000.0
    }
}

fn concrete_name(name: &str) -> Option<&str> {
    if name == AUTO_DEVICE {
        None
    } else {
        Some(name)
    }
}

/// Preferred setup descriptor passed to the platform audio layer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceSetup {
    pub sample_rate: u32,
    pub buffer_size: u32,
    /// `None` = platform default output
    pub output_device_name: Option<String>,
    /// `None` = platform default input
    pub input_device_name: Option<String>,
}

/// Configuration the hardware/driver stack actually granted
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolvedDeviceConfig {
    pub sample_rate: u32,
    pub buffer_size: u32,
    /// Empty when no output device was opened
    pub output_device_name: String,
    /// Empty when no input device was opened
    pub input_device_name: String,
    pub input_channels: u16,
    pub output_channels: u16,
}

impl ResolvedDeviceConfig {
    /// Audio latency in milliseconds (one-way, output only)
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate.max(1) as f32) * 1000.0
    }
}
