//! Audio error types
//!
//! `PlatformError` is what the platform audio layer reports. `AudioError` is
//! the negotiation taxonomy the shell surfaces as a fatal condition.

use std::fmt;

use thiserror::Error;

/// Guidance appended to device-name failures
const USE_AUTO_HINT: &str =
    "fix this in userprefs.yaml (you can use \"auto\" for the default device)";

/// Errors reported by the platform audio layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The named device does not exist on any host
    #[error("No such device: {0}")]
    NoSuchDevice(String),

    /// Any other backend failure, passed through verbatim
    #[error("{0}")]
    Backend(String),
}

/// The field of a device setup that the hardware did not grant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupField {
    OutputDevice,
    InputDevice,
    BufferSize,
    SampleRate,
}

impl fmt::Display for SetupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SetupField::OutputDevice => "output device",
            SetupField::InputDevice => "input device",
            SetupField::BufferSize => "buffer size",
            SetupField::SampleRate => "sample rate",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during audio operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Requested device name unavailable
    #[error("error initializing audio device: {message}\n{}", USE_AUTO_HINT)]
    DeviceNotFound { message: String },

    /// Hardware granted something other than what was requested
    #[error("error setting {field} to {requested} (device reports {granted}), {}", mismatch_hint(.field))]
    ConfigurationMismatch {
        field: SetupField,
        requested: String,
        granted: String,
    },

    /// Generic platform audio-init error, message passed through verbatim
    #[error("error initializing audio device: {0}")]
    InitializationFailure(String),

    /// No audio devices available
    #[error("No audio devices found")]
    NoDevices,

    /// Failed to get default device
    #[error("Failed to get default audio device: {0}")]
    NoDefaultDevice(String),

    /// Failed to query device configuration
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// Failed to build audio stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// Failed to start/play stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlayError(String),

    /// Unsupported sample format
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),
}

fn mismatch_hint(field: &SetupField) -> &'static str {
    match field {
        SetupField::OutputDevice | SetupField::InputDevice => {
            "fix this in userprefs.yaml (use \"auto\" for default device)"
        }
        SetupField::BufferSize | SetupField::SampleRate => "fix this in userprefs.yaml",
    }
}

impl AudioError {
    /// Human-readable message handed to the engine's fatal error channel
    pub fn fatal_message(&self) -> String {
        self.to_string()
    }

    /// Whether this error halts the audio subsystem
    ///
    /// Negotiation failures are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AudioError::DeviceNotFound { .. }
                | AudioError::ConfigurationMismatch { .. }
                | AudioError::InitializationFailure(_)
        )
    }
}

impl From<PlatformError> for AudioError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::NoSuchDevice(_) => AudioError::DeviceNotFound {
                message: err.to_string(),
            },
            PlatformError::Backend(message) => AudioError::InitializationFailure(message),
        }
    }
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
