//! CPAL implementation of `AudioPlatform`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐   push()   ┌─────────────────────┐
//! │  CPAL input stream  │──────────►│  Input sample ring  │  <── lock-free SPSC
//! │  (interleaved f32)  │           │   (rtrb, f32)       │
//! └─────────────────────┘           └──────────┬──────────┘
//!                                              │ pop()
//!                                   ┌──────────▼──────────┐
//!                                   │  CPAL output stream │
//!                                   │  deinterleave ─► AudioIoCallback::process
//!                                   │  interleave  ◄─┘    │
//!                                   └─────────────────────┘
//! ```
//!
//! The output stream drives processing. Both planar blocks and the interleave
//! scratch buffer are allocated when the callback is registered, never in the
//! data callbacks.
//!
//! Requested sample rate and buffer size are granted when the device supports
//! them; otherwise the closest supported values are used without error and the
//! negotiator reports the difference. Devices with more channels than the
//! ceiling are opened as-is and only the first channels reach the callback.

use std::cmp::Reverse;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{
    SampleFormat, SampleRate, Stream, StreamConfig, SupportedBufferSize,
    SupportedStreamConfigRange,
};

use super::block::AudioBlock;
use super::config::{DeviceSetup, ResolvedDeviceConfig, MAX_BUFFER_SIZE};
use super::device::{resolve_device, Direction};
use super::error::{AudioError, PlatformError};
use super::platform::{AudioIoCallback, AudioPlatform};

/// Input ring capacity in buffers of the granted size
const INPUT_RING_BUFFERS: usize = 4;

/// An opened device and the stream configuration chosen for it
struct OpenDevice {
    device: cpal::Device,
    name: String,
    config: StreamConfig,
    /// Channels exposed to the callback, at most the ceiling
    lanes: u16,
}

/// Streams kept alive while a callback is registered
struct ActiveStreams {
    _output: Stream,
    _input: Option<Stream>,
    callback: Arc<dyn AudioIoCallback>,
}

/// cpal-backed audio platform
///
/// Dropping it stops the streams and releases the devices.
#[derive(Default)]
pub struct CpalPlatform {
    output: Option<OpenDevice>,
    input: Option<OpenDevice>,
    resolved: ResolvedDeviceConfig,
    streams: Option<ActiveStreams>,
}

impl CpalPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

fn backend_error(err: AudioError) -> PlatformError {
    PlatformError::Backend(err.to_string())
}

/// Ranking for a channel count against the ceiling
///
/// Every range under the ceiling beats every range over it. Under the
/// ceiling more channels win, over it fewer do.
fn channel_rank(channels: u16, max_channels: u16) -> i32 {
    if channels <= max_channels {
        i32::from(channels)
    } else {
        -i32::from(channels)
    }
}

/// Pick a range and granted rate among f32 `ranges`
///
/// A range containing `sample_rate` is preferred; otherwise the range whose
/// closest supported rate is nearest wins.
fn select_range(
    ranges: &[SupportedStreamConfigRange],
    sample_rate: u32,
    max_channels: u16,
) -> Option<(&SupportedStreamConfigRange, u32)> {
    let candidates = || ranges.iter().filter(|r| r.sample_format() == SampleFormat::F32);
    let closest_rate = |r: &SupportedStreamConfigRange| {
        sample_rate.clamp(r.min_sample_rate().0, r.max_sample_rate().0)
    };

    if let Some(range) = candidates()
        .filter(|r| closest_rate(*r) == sample_rate)
        .max_by_key(|r| channel_rank(r.channels(), max_channels))
    {
        return Some((range, sample_rate));
    }

    candidates()
        .min_by_key(|r| {
            (
                closest_rate(*r).abs_diff(sample_rate),
                Reverse(channel_rank(r.channels(), max_channels)),
            )
        })
        .map(|r| (r, closest_rate(r)))
}

/// Buffer size granted for `requested` within what the range supports
fn select_buffer_size(
    direction: Direction,
    requested: u32,
    supported: &SupportedBufferSize,
) -> Result<u32, PlatformError> {
    match supported {
        SupportedBufferSize::Range { min, max } => {
            let upper = (*max).min(MAX_BUFFER_SIZE as u32);
            if *min > upper {
                return Err(backend_error(AudioError::UnsupportedFormat(format!(
                    "{} device needs at least {} frames per buffer, limit is {}",
                    direction, min, upper
                ))));
            }
            let clamped = requested.clamp(*min, upper);
            if clamped != requested {
                log::warn!(
                    "Audio {} device doesn't support {} frames, using {}",
                    direction,
                    requested,
                    clamped
                );
            }
            Ok(clamped)
        }
        // Driver decides at build time; a refusal surfaces from add_callback
        SupportedBufferSize::Unknown => Ok(requested.min(MAX_BUFFER_SIZE as u32)),
    }
}

/// Pick an f32 stream configuration for `device`
///
/// Returns the stream config, the granted buffer size and the number of
/// channels exposed to the callback.
fn choose_config(
    device: &cpal::Device,
    direction: Direction,
    sample_rate: u32,
    buffer_size: u32,
    max_channels: u16,
) -> Result<(StreamConfig, u32, u16), PlatformError> {
    let ranges: Vec<SupportedStreamConfigRange> = match direction {
        Direction::Input => device.supported_input_configs().map(|c| c.collect()),
        Direction::Output => device.supported_output_configs().map(|c| c.collect()),
    }
    .map_err(|e| backend_error(AudioError::ConfigError(e.to_string())))?;

    let (range, granted_rate) = select_range(&ranges, sample_rate, max_channels).ok_or_else(|| {
        backend_error(AudioError::UnsupportedFormat(format!(
            "no f32 {} configuration",
            direction
        )))
    })?;

    if granted_rate != sample_rate {
        log::warn!(
            "Audio {} device doesn't support {}Hz, using {}Hz",
            direction,
            sample_rate,
            granted_rate
        );
    }
    let lanes = range.channels().min(max_channels);
    if lanes < range.channels() {
        log::warn!(
            "Audio {} device has {} channels, using the first {}",
            direction,
            range.channels(),
            lanes
        );
    }

    let granted_buffer = select_buffer_size(direction, buffer_size, range.buffer_size())?;

    let config = StreamConfig {
        channels: range.channels(),
        sample_rate: SampleRate(granted_rate),
        buffer_size: cpal::BufferSize::Fixed(granted_buffer),
    };
    Ok((config, granted_buffer, lanes))
}

/// Announce the start to `callback`, run `start`, and announce the stop if it fails
fn start_with_lifecycle<T>(
    callback: &dyn AudioIoCallback,
    resolved: &ResolvedDeviceConfig,
    start: impl FnOnce() -> Result<T, PlatformError>,
) -> Result<T, PlatformError> {
    callback.about_to_start(resolved);
    start().inspect_err(|_| callback.stopped())
}

impl AudioPlatform for CpalPlatform {
    fn initialise(
        &mut self,
        setup: &DeviceSetup,
        max_input_channels: u16,
        max_output_channels: u16,
    ) -> Result<(), PlatformError> {
        self.close_device();

        let output_device = resolve_device(setup.output_device_name.as_deref(), Direction::Output)?
            .ok_or_else(|| backend_error(AudioError::NoDefaultDevice("output".to_string())))?;
        let output_name = output_device
            .name()
            .unwrap_or_else(|_| "Unknown".to_string());
        let (output_config, buffer_size, output_lanes) = choose_config(
            &output_device,
            Direction::Output,
            setup.sample_rate,
            setup.buffer_size,
            max_output_channels,
        )?;
        let sample_rate = output_config.sample_rate.0;
        log::info!(
            "Output device: {} ({} ch, {}Hz, {} frames)",
            output_name,
            output_lanes,
            sample_rate,
            buffer_size
        );

        // Input runs at whatever the output granted
        let input = match resolve_device(setup.input_device_name.as_deref(), Direction::Input)? {
            Some(device) if max_input_channels > 0 => {
                let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
                match choose_config(
                    &device,
                    Direction::Input,
                    sample_rate,
                    buffer_size,
                    max_input_channels,
                ) {
                    Ok((mut config, _, lanes)) if config.sample_rate.0 == sample_rate => {
                        config.buffer_size = cpal::BufferSize::Fixed(buffer_size);
                        log::info!("Input device: {} ({} ch)", name, lanes);
                        Some(OpenDevice {
                            device,
                            name,
                            config,
                            lanes,
                        })
                    }
                    Ok(_) => {
                        log::warn!("Input device {} can't run at {}Hz, input disabled", name, sample_rate);
                        None
                    }
                    Err(e) => {
                        log::warn!("Input device {} unusable, input disabled: {}", name, e);
                        None
                    }
                }
            }
            _ => None,
        };

        self.resolved = ResolvedDeviceConfig {
            sample_rate,
            buffer_size,
            output_device_name: output_name.clone(),
            input_device_name: input.as_ref().map(|i| i.name.clone()).unwrap_or_default(),
            input_channels: input.as_ref().map(|i| i.lanes).unwrap_or(0),
            output_channels: output_lanes,
        };
        self.output = Some(OpenDevice {
            device: output_device,
            name: output_name,
            config: output_config,
            lanes: output_lanes,
        });
        self.input = input;
        Ok(())
    }

    fn current_setup(&self) -> ResolvedDeviceConfig {
        self.resolved.clone()
    }

    fn add_callback(&mut self, callback: Arc<dyn AudioIoCallback>) -> Result<(), PlatformError> {
        if self.streams.is_some() {
            return Err(PlatformError::Backend(
                "an audio callback is already registered".to_string(),
            ));
        }
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| PlatformError::Backend("audio device not initialised".to_string()))?;

        let input = self.input.as_ref();
        let (output_stream, input_stream) =
            start_with_lifecycle(callback.as_ref(), &self.resolved, || {
                let in_channels = input.map(|i| i.config.channels as usize).unwrap_or(0);
                let ring_len = (self.resolved.buffer_size as usize).max(1)
                    * in_channels.max(1)
                    * INPUT_RING_BUFFERS;
                let (producer, consumer) = rtrb::RingBuffer::<f32>::new(ring_len);

                let input_stream = match input {
                    Some(input) => Some(build_input_stream(input, producer).map_err(backend_error)?),
                    None => None,
                };
                let output_stream =
                    build_output_stream(output, input, consumer, Arc::clone(&callback))
                        .map_err(backend_error)?;

                if let Some(stream) = &input_stream {
                    stream.play().map_err(|e| {
                        backend_error(AudioError::StreamPlayError(format!("Input: {}", e)))
                    })?;
                }
                output_stream.play().map_err(|e| {
                    backend_error(AudioError::StreamPlayError(format!("Output: {}", e)))
                })?;
                Ok((output_stream, input_stream))
            })?;

        log::info!("Audio streams started");

        self.streams = Some(ActiveStreams {
            _output: output_stream,
            _input: input_stream,
            callback,
        });
        Ok(())
    }

    fn remove_callback(&mut self) {
        if let Some(streams) = self.streams.take() {
            let callback = Arc::clone(&streams.callback);
            // Dropping the streams joins the cpal callback threads
            drop(streams);
            callback.stopped();
        }
    }

    fn close_device(&mut self) {
        self.remove_callback();
        if self.output.take().is_some() {
            log::info!("Audio device closed");
        }
        self.input = None;
        self.resolved = ResolvedDeviceConfig::default();
    }

    fn has_callback(&self) -> bool {
        self.streams.is_some()
    }
}

impl Drop for CpalPlatform {
    fn drop(&mut self) {
        self.close_device();
    }
}

/// Input stream: push interleaved samples into the ring, dropping on overflow
fn build_input_stream(
    input: &OpenDevice,
    mut producer: rtrb::Producer<f32>,
) -> Result<Stream, AudioError> {
    input
        .device
        .build_input_stream(
            &input.config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                for &sample in data {
                    // Output stream is behind; drop the rest of this block
                    if producer.push(sample).is_err() {
                        break;
                    }
                }
            },
            move |err| {
                log::error!("Input audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))
}

/// Buffers owned by the output data callback
struct OutputProcessor {
    /// Interleaved channel counts of the devices
    device_in_channels: usize,
    device_out_channels: usize,
    input_block: AudioBlock,
    output_block: AudioBlock,
    scratch: Vec<f32>,
}

impl OutputProcessor {
    /// Allocate every buffer the data callback will touch
    fn new(
        device_in_channels: usize,
        in_lanes: usize,
        device_out_channels: usize,
        out_lanes: usize,
    ) -> Self {
        Self {
            device_in_channels,
            device_out_channels,
            input_block: AudioBlock::new(in_lanes, MAX_BUFFER_SIZE),
            output_block: AudioBlock::new(out_lanes, MAX_BUFFER_SIZE),
            scratch: vec![0.0; MAX_BUFFER_SIZE * device_in_channels.max(1)],
        }
    }

    /// Fill one interleaved device buffer
    ///
    /// Runs `callback` once per `MAX_BUFFER_SIZE` frames. Input the ring
    /// can't supply plays as silence.
    fn process(
        &mut self,
        data: &mut [f32],
        consumer: &mut rtrb::Consumer<f32>,
        callback: &dyn AudioIoCallback,
    ) {
        let out_channels = self.device_out_channels;
        if out_channels == 0 {
            return;
        }
        for chunk in data.chunks_mut(MAX_BUFFER_SIZE * out_channels) {
            let frames = chunk.len() / out_channels;

            if self.device_in_channels == 0 {
                self.input_block.set_frames(frames);
            } else {
                let wanted = frames * self.device_in_channels;
                for slot in self.scratch[..wanted].iter_mut() {
                    *slot = consumer.pop().unwrap_or(0.0);
                }
                self.input_block
                    .read_interleaved(&self.scratch[..wanted], self.device_in_channels);
            }

            self.output_block.set_frames(frames);
            self.output_block.fill_silence();
            callback.process(&self.input_block, &mut self.output_block);
            self.output_block.write_interleaved(chunk, out_channels);
        }
    }
}

/// Output stream: pull input from the ring, run the callback, interleave out
fn build_output_stream(
    output: &OpenDevice,
    input: Option<&OpenDevice>,
    mut consumer: rtrb::Consumer<f32>,
    callback: Arc<dyn AudioIoCallback>,
) -> Result<Stream, AudioError> {
    let mut processor = OutputProcessor::new(
        input.map(|i| i.config.channels as usize).unwrap_or(0),
        input.map(|i| i.lanes as usize).unwrap_or(0),
        output.config.channels as usize,
        output.lanes as usize,
    );

    output
        .device
        .build_output_stream(
            &output.config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                processor.process(data, &mut consumer, callback.as_ref());
            },
            move |err| {
                log::error!("Output audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))
}
