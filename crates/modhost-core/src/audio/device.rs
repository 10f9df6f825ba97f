//! Audio device enumeration and lookup
//!
//! Devices are enumerated from ALL available cpal hosts (JACK, ALSA, PulseAudio,
//! CoreAudio, WASAPI...). Preferences name devices by their plain name, so a
//! lookup searches every host and takes the first match.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::HostId;

use super::error::{AudioError, AudioResult, PlatformError};

/// Sample rates checked against each supported range
const COMMON_SAMPLE_RATES: [u32; 6] = [44100, 48000, 88200, 96000, 176400, 192000];

/// Which side of the duplex stream a device serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Human-readable name for a host ID
pub(crate) fn host_name(host_id: HostId) -> String {
    let name = format!("{:?}", host_id);
    match name.as_str() {
        "Alsa" => "ALSA".to_string(),
        "Jack" => "JACK".to_string(),
        "Wasapi" => "WASAPI".to_string(),
        "Asio" => "ASIO".to_string(),
        _ => name,
    }
}

/// An audio device as shown by `--list-devices`
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Name to put in userprefs.yaml
    pub name: String,
    /// Host backend name (e.g., "ALSA", "JACK")
    pub host: String,
    pub direction: Direction,
    /// Whether this is the default device for its host
    pub is_default: bool,
    /// Common sample rates inside the supported ranges
    pub sample_rates: Vec<u32>,
    pub max_channels: u16,
}

impl std::fmt::Display for AudioDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({} ch, {:?}){}",
            self.host,
            self.name,
            self.max_channels,
            self.sample_rates,
            if self.is_default { " *default*" } else { "" }
        )
    }
}

fn devices_of(host: &cpal::Host, direction: Direction) -> Option<Vec<cpal::Device>> {
    let result: Result<Vec<cpal::Device>, _> = match direction {
        Direction::Input => host.input_devices().map(|d| d.collect()),
        Direction::Output => host.output_devices().map(|d| d.collect()),
    };
    match result {
        Ok(devices) => Some(devices),
        Err(e) => {
            log::debug!("Could not enumerate {} devices: {}", direction, e);
            None
        }
    }
}

fn default_of(host: &cpal::Host, direction: Direction) -> Option<cpal::Device> {
    match direction {
        Direction::Input => host.default_input_device(),
        Direction::Output => host.default_output_device(),
    }
}

fn supported_ranges(
    device: &cpal::Device,
    direction: Direction,
) -> Option<Vec<cpal::SupportedStreamConfigRange>> {
    let result: Result<Vec<cpal::SupportedStreamConfigRange>, _> = match direction {
        Direction::Input => device.supported_input_configs().map(|c| c.collect()),
        Direction::Output => device.supported_output_configs().map(|c| c.collect()),
    };
    result.ok()
}

/// Enumerate devices of one direction from all hosts
///
/// Default devices come first, then by host, then by name.
pub fn get_devices(direction: Direction) -> AudioResult<Vec<AudioDevice>> {
    let mut all_devices: Vec<AudioDevice> = Vec::new();

    for host_id in cpal::available_hosts() {
        let host = match cpal::host_from_id(host_id) {
            Ok(h) => h,
            Err(e) => {
                log::debug!("Could not initialize host {:?}: {}", host_id, e);
                continue;
            }
        };
        let host_label = host_name(host_id);
        let default_name = default_of(&host, direction).and_then(|d| d.name().ok());

        let Some(devices) = devices_of(&host, direction) else {
            continue;
        };

        for device in devices {
            let Ok(name) = device.name() else {
                continue;
            };
            let Some(ranges) = supported_ranges(&device, direction) else {
                continue;
            };
            if ranges.is_empty() {
                continue;
            }

            let mut sample_rates: Vec<u32> = Vec::new();
            let mut max_channels: u16 = 0;
            for range in &ranges {
                max_channels = max_channels.max(range.channels());
                for rate in COMMON_SAMPLE_RATES {
                    if rate >= range.min_sample_rate().0
                        && rate <= range.max_sample_rate().0
                        && !sample_rates.contains(&rate)
                    {
                        sample_rates.push(rate);
                    }
                }
            }
            sample_rates.sort_unstable();

            all_devices.push(AudioDevice {
                is_default: default_name.as_ref() == Some(&name),
                name,
                host: host_label.clone(),
                direction,
                sample_rates,
                max_channels,
            });
        }
    }

    if all_devices.is_empty() {
        return Err(AudioError::NoDevices);
    }

    all_devices.sort_by(|a, b| {
        b.is_default
            .cmp(&a.is_default)
            .then_with(|| a.host.cmp(&b.host))
            .then_with(|| a.name.cmp(&b.name))
    });

    log::info!(
        "Enumerated {} {} devices from {} hosts",
        all_devices.len(),
        direction,
        cpal::available_hosts().len()
    );

    Ok(all_devices)
}

/// Find a device by exact name across all hosts
pub fn find_device_by_name(name: &str, direction: Direction) -> Result<cpal::Device, PlatformError> {
    for host_id in cpal::available_hosts() {
        let Ok(host) = cpal::host_from_id(host_id) else {
            continue;
        };
        let Some(devices) = devices_of(&host, direction) else {
            continue;
        };
        if let Some(device) = devices
            .into_iter()
            .find(|d| d.name().ok().as_deref() == Some(name))
        {
            log::debug!("Found {} device '{}' on {}", direction, name, host_name(host_id));
            return Ok(device);
        }
    }
    Err(PlatformError::NoSuchDevice(name.to_string()))
}

/// The default device of the default host, if any
pub fn default_device(direction: Direction) -> Option<cpal::Device> {
    default_of(&cpal::default_host(), direction)
}

/// Resolve a preference name (`None` = default) to a cpal device
///
/// A missing default input is not an error: the shell runs output-only.
pub fn resolve_device(
    name: Option<&str>,
    direction: Direction,
) -> Result<Option<cpal::Device>, PlatformError> {
    match name {
        Some(name) => find_device_by_name(name, direction).map(Some),
        None => match default_device(direction) {
            Some(device) => Ok(Some(device)),
            None if direction == Direction::Input => Ok(None),
            None => Err(PlatformError::Backend(
                "no default output device".to_string(),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_names_are_capitalized() {
        for host_id in cpal::available_hosts() {
            let name = host_name(host_id);
            assert!(!name.is_empty());
        }
    }

    #[test]
    fn test_unknown_device_is_no_such_device() {
        let name = "modhost-test-device-that-does-not-exist";
        match find_device_by_name(name, Direction::Output) {
            Err(PlatformError::NoSuchDevice(n)) => assert_eq!(n, name),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("found a device that should not exist"),
        }
    }

    #[test]
    fn test_device_enumeration() {
        // May find nothing in CI
        match get_devices(Direction::Output) {
            Ok(devices) => {
                for device in &devices {
                    println!("  - {}", device);
                }
            }
            Err(AudioError::NoDevices) => println!("No audio devices available"),
            Err(e) => println!("Error enumerating devices: {}", e),
        }
    }
}
