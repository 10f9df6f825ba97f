//! Device Negotiator
//!
//! Reconciles the requested `DeviceConfig` against what the platform grants:
//!
//! 1. Build the preferred setup (device names omitted when "auto")
//! 2. Initialise the platform with the channel ceilings
//! 3. Compare output name, input name, buffer size, sample rate (in that
//!    order, concrete names only); the first mismatch is fatal
//! 4. Register the callback and publish the global audio parameters
//!
//! Nothing is registered or published unless every check passes.

use std::sync::Arc;

use super::config::{DeviceConfig, ResolvedDeviceConfig};
use super::error::{AudioError, AudioResult, SetupField};
use super::params::AudioParams;
use super::platform::{AudioIoCallback, AudioPlatform};

/// Negotiate `requested` with `platform`, publishing into `params` on success
///
/// Must not be re-run while a callback from a previous negotiation is still
/// registered.
pub fn negotiate<P>(
    platform: &mut P,
    requested: &DeviceConfig,
    callback: Arc<dyn AudioIoCallback>,
    params: &AudioParams,
) -> AudioResult<ResolvedDeviceConfig>
where
    P: AudioPlatform + ?Sized,
{
    debug_assert!(
        !platform.has_callback(),
        "negotiate called with a callback still registered"
    );

    let setup = requested.preferred_setup();
    log::info!(
        "Requesting audio setup: output={} input={} {}Hz {} frames",
        requested.output_device_name,
        requested.input_device_name,
        setup.sample_rate,
        setup.buffer_size
    );

    platform.initialise(
        &setup,
        requested.max_input_channels,
        requested.max_output_channels,
    )?;

    let granted = platform.current_setup();
    check_granted(requested, &granted)?;

    platform
        .add_callback(callback)
        .map_err(|e| AudioError::InitializationFailure(e.to_string()))?;

    log::info!(
        "output: {}   input: {}",
        granted.output_device_name,
        granted.input_device_name
    );

    params.set_buffer_size(granted.buffer_size);
    params.set_sample_rate(granted.sample_rate);

    Ok(granted)
}

/// Field-by-field comparison, first mismatch wins
fn check_granted(requested: &DeviceConfig, granted: &ResolvedDeviceConfig) -> AudioResult<()> {
    if let Some(name) = requested.requested_output() {
        if granted.output_device_name != name {
            return Err(mismatch(
                SetupField::OutputDevice,
                name,
                &granted.output_device_name,
            ));
        }
    }
    if let Some(name) = requested.requested_input() {
        if granted.input_device_name != name {
            return Err(mismatch(
                SetupField::InputDevice,
                name,
                &granted.input_device_name,
            ));
        }
    }
    if granted.buffer_size != requested.buffer_size {
        return Err(mismatch(
            SetupField::BufferSize,
            requested.buffer_size,
            granted.buffer_size,
        ));
    }
    if granted.sample_rate != requested.sample_rate {
        return Err(mismatch(
            SetupField::SampleRate,
            requested.sample_rate,
            granted.sample_rate,
        ));
    }
    Ok(())
}

fn mismatch(
    field: SetupField,
    requested: impl ToString,
    granted: impl ToString,
) -> AudioError {
    AudioError::ConfigurationMismatch {
        field,
        requested: requested.to_string(),
        granted: granted.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::error::PlatformError;
    use crate::testing::StubPlatform;

    fn granted(output: &str, input: &str, rate: u32, buffer: u32) -> ResolvedDeviceConfig {
        ResolvedDeviceConfig {
            sample_rate: rate,
            buffer_size: buffer,
            output_device_name: output.to_string(),
            input_device_name: input.to_string(),
            input_channels: 2,
            output_channels: 2,
        }
    }

    fn noop_callback() -> Arc<dyn AudioIoCallback> {
        Arc::new(crate::testing::NullCallback)
    }

    #[test]
    fn test_auto_devices_exact_grant_succeeds() {
        let mut platform = StubPlatform::granting(granted("Built-in", "Mic", 44100, 256));
        let params = AudioParams::new();
        let requested = DeviceConfig::default()
            .with_sample_rate(44100)
            .with_buffer_size(256);

        let resolved = negotiate(&mut platform, &requested, noop_callback(), &params).unwrap();

        assert_eq!(resolved.sample_rate, 44100);
        assert_eq!(platform.add_callback_calls(), 1);
        assert_eq!(params.sample_rate(), 44100);
        assert_eq!(params.buffer_size(), 256);

        let setup = platform.last_setup().unwrap();
        assert_eq!(setup.output_device_name, None);
        assert_eq!(setup.input_device_name, None);
    }

    #[test]
    fn test_output_name_mismatch_is_fatal() {
        let mut platform = StubPlatform::granting(granted("Headphones", "Mic", 48000, 256));
        let params = AudioParams::new();
        params.set_sample_rate(22050);
        let requested = DeviceConfig::default().with_output_device("Speakers");

        let err = negotiate(&mut platform, &requested, noop_callback(), &params).unwrap_err();

        let message = err.fatal_message();
        assert!(message.contains("output device"), "{message}");
        assert!(message.contains("Speakers"), "{message}");
        assert!(err.is_fatal());
        // Nothing registered, nothing published
        assert_eq!(platform.add_callback_calls(), 0);
        assert_eq!(params.sample_rate(), 22050);
    }

    #[test]
    fn test_first_mismatch_wins() {
        // Input name, buffer size and rate all differ; input is checked first
        let mut platform = StubPlatform::granting(granted("Out", "Other", 44100, 512));
        let requested = DeviceConfig::default()
            .with_input_device("Line In")
            .with_sample_rate(48000)
            .with_buffer_size(256);

        let err = negotiate(&mut platform, &requested, noop_callback(), &AudioParams::new())
            .unwrap_err();

        assert!(matches!(
            err,
            AudioError::ConfigurationMismatch {
                field: SetupField::InputDevice,
                ..
            }
        ));
    }

    #[test]
    fn test_buffer_checked_before_rate() {
        let mut platform = StubPlatform::granting(granted("Out", "In", 44100, 512));
        let requested = DeviceConfig::default()
            .with_sample_rate(48000)
            .with_buffer_size(256);

        let err = negotiate(&mut platform, &requested, noop_callback(), &AudioParams::new())
            .unwrap_err();

        assert!(err.fatal_message().starts_with("error setting buffer size to 256"));
    }

    #[test]
    fn test_sample_rate_downgrade_is_fatal() {
        let mut platform = StubPlatform::granting(granted("Out", "In", 44100, 256));
        let requested = DeviceConfig::default().with_buffer_size(256);

        let err = negotiate(&mut platform, &requested, noop_callback(), &AudioParams::new())
            .unwrap_err();

        assert!(matches!(
            err,
            AudioError::ConfigurationMismatch {
                field: SetupField::SampleRate,
                ..
            }
        ));
        assert_eq!(platform.add_callback_calls(), 0);
    }

    #[test]
    fn test_auto_names_are_not_compared() {
        let mut platform = StubPlatform::granting(granted("Anything", "", 48000, 256));
        let requested = DeviceConfig::default();

        assert!(negotiate(&mut platform, &requested, noop_callback(), &AudioParams::new()).is_ok());
    }

    #[test]
    fn test_missing_device_gets_auto_hint() {
        let mut platform =
            StubPlatform::failing(PlatformError::NoSuchDevice("Studio 2".to_string()));
        let requested = DeviceConfig::default().with_output_device("Studio 2");

        let err = negotiate(&mut platform, &requested, noop_callback(), &AudioParams::new())
            .unwrap_err();

        assert!(matches!(err, AudioError::DeviceNotFound { .. }));
        assert!(err.fatal_message().contains("\"auto\""));
        assert_eq!(platform.add_callback_calls(), 0);
    }

    #[test]
    fn test_backend_failure_passes_through() {
        let mut platform = StubPlatform::failing(PlatformError::Backend("device busy".to_string()));

        let err = negotiate(
            &mut platform,
            &DeviceConfig::default(),
            noop_callback(),
            &AudioParams::new(),
        )
        .unwrap_err();

        assert_eq!(err, AudioError::InitializationFailure("device busy".to_string()));
    }

    #[test]
    fn test_channel_ceilings_are_passed() {
        let mut platform = StubPlatform::granting(granted("Out", "In", 48000, 256));
        let mut requested = DeviceConfig::default();
        requested.max_input_channels = 4;
        requested.max_output_channels = 8;

        negotiate(&mut platform, &requested, noop_callback(), &AudioParams::new()).unwrap();

        assert_eq!(platform.channel_ceilings(), Some((4, 8)));
    }
}
