//! Platform audio layer capability
//!
//! The negotiator talks to the hardware only through `AudioPlatform`. The
//! cpal implementation lives in `cpal_backend`; tests use an in-memory stub.

use std::sync::Arc;

use super::block::AudioBlock;
use super::config::{DeviceSetup, ResolvedDeviceConfig};
use super::error::PlatformError;

/// Real-time callback target registered with the platform
///
/// `process` runs on the platform's audio thread and must not allocate,
/// block, perform I/O or panic. The lifecycle hooks run on the thread that
/// registers/unregisters.
pub trait AudioIoCallback: Send + Sync {
    /// Consume `input` and fill `output`; both carry the same frame count
    fn process(&self, input: &AudioBlock, output: &mut AudioBlock);

    /// Streams are about to start with the granted configuration
    fn about_to_start(&self, _resolved: &ResolvedDeviceConfig) {}

    /// Streams have stopped; `process` will not be called again
    fn stopped(&self) {}
}

/// Capability interface over the platform audio device stack
pub trait AudioPlatform {
    /// Open devices according to `setup`, capping channel counts
    ///
    /// The platform may silently grant something other than requested; the
    /// caller compares `current_setup()` afterwards.
    fn initialise(
        &mut self,
        setup: &DeviceSetup,
        max_input_channels: u16,
        max_output_channels: u16,
    ) -> Result<(), PlatformError>;

    /// What the hardware actually granted
    fn current_setup(&self) -> ResolvedDeviceConfig;

    /// Register the real-time callback and start streaming
    fn add_callback(&mut self, callback: Arc<dyn AudioIoCallback>) -> Result<(), PlatformError>;

    /// Stop streaming and drop the registered callback (no-op if none)
    fn remove_callback(&mut self);

    /// Release the devices (no-op if not open)
    fn close_device(&mut self);

    /// Whether a callback is currently registered
    fn has_callback(&self) -> bool;
}
