//! Audio side of the shell
//!
//! - **Negotiation** (`negotiate`): reconcile requested vs. granted device setup
//! - **Bridge** (`AudioBridge`): real-time forwarding into the engine
//! - **Platform** (`AudioPlatform`): capability trait; `CpalPlatform` is the real one
//!
//! The audio thread only ever touches the bridge and lock-free state. The
//! render lock is not part of this path.

mod block;
mod bridge;
mod config;
mod cpal_backend;
mod device;
mod error;
mod negotiate;
mod params;
mod platform;

pub use block::{AudioBlock, Sample};
pub use bridge::AudioBridge;
pub use config::{
    DeviceConfig, DeviceSetup, ResolvedDeviceConfig, AUTO_DEVICE, DEFAULT_BUFFER_SIZE,
    DEFAULT_SAMPLE_RATE, MAX_BUFFER_SIZE, MAX_INPUT_CHANNELS, MAX_OUTPUT_CHANNELS,
};
pub use cpal_backend::CpalPlatform;
pub use device::{find_device_by_name, get_devices, AudioDevice, Direction};
pub use error::{AudioError, AudioResult, PlatformError, SetupField};
pub use negotiate::negotiate;
pub use params::{global_buffer_size, global_sample_rate, AudioParams};
pub use platform::{AudioIoCallback, AudioPlatform};
