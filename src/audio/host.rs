use std::fmt;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use crossbeam_channel::{Receiver, Sender, bounded};
use thiserror::Error;

use super::engine::ReverbEngine;
use crate::types::MeterSnapshot;

/// Meter updates per second sent to the UI
const METER_RATE_HZ: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Input,
    Output,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Input => write!(f, "input"),
            DeviceKind::Output => write!(f, "output"),
        }
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("no audio {0} devices found")]
    NoDevices(DeviceKind),
    #[error("audio {kind} device '{search}' not found")]
    DeviceNotFound { kind: DeviceKind, search: String },
    #[error("audio {kind} device index {index} out of range ({count} devices)")]
    IndexOutOfRange {
        kind: DeviceKind,
        index: usize,
        count: usize,
    },
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(cpal::SampleFormat),
    #[error(transparent)]
    Devices(#[from] cpal::DevicesError),
    #[error(transparent)]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error(transparent)]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),
    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error(transparent)]
    PlayStream(#[from] cpal::PlayStreamError),
}

fn devices(kind: DeviceKind) -> Result<Vec<cpal::Device>, HostError> {
    let host = cpal::default_host();
    let devices: Vec<cpal::Device> = match kind {
        DeviceKind::Input => host.input_devices()?.collect(),
        DeviceKind::Output => host.output_devices()?.collect(),
    };
    Ok(devices)
}

/// Names of the available devices, in index order
pub fn list_devices(kind: DeviceKind) -> Result<Vec<String>, HostError> {
    let names: Vec<String> = devices(kind)?
        .iter()
        .map(|device| {
            device
                .description()
                .map(|desc| desc.name().to_string())
                .unwrap_or_else(|_| "Unknown".to_string())
        })
        .collect();

    if names.is_empty() {
        return Err(HostError::NoDevices(kind));
    }
    Ok(names)
}

/// Find audio device index by name or index string
pub fn find_device(devices: &[String], search: &str, kind: DeviceKind) -> Result<usize, HostError> {
    // Try to parse as index first
    if let Ok(index) = search.parse::<usize>() {
        if index < devices.len() {
            return Ok(index);
        }
        return Err(HostError::IndexOutOfRange {
            kind,
            index,
            count: devices.len(),
        });
    }

    // Search by name (case-insensitive substring match)
    let search_lower = search.to_lowercase();
    devices
        .iter()
        .position(|device| device.to_lowercase().contains(&search_lower))
        .ok_or_else(|| HostError::DeviceNotFound {
            kind,
            search: search.to_string(),
        })
}

pub fn open_device(kind: DeviceKind, index: usize) -> Result<cpal::Device, HostError> {
    let mut all = devices(kind)?;
    let count = all.len();
    if index >= count {
        return Err(HostError::IndexOutOfRange { kind, index, count });
    }
    Ok(all.swap_remove(index))
}

/// Running input and output streams; dropping this stops audio
pub struct AudioStreams {
    _input: cpal::Stream,
    _output: cpal::Stream,
    pub sample_rate: f32,
    pub output_channels: usize,
}

/// Prepare `engine` for the output device and start both streams
pub fn start_streams(
    input_device: &cpal::Device,
    output_device: &cpal::Device,
    mut engine: ReverbEngine,
    block_size: usize,
    meter_tx: Sender<MeterSnapshot>,
) -> Result<AudioStreams, HostError> {
    let output_config = output_device.default_output_config()?;
    let input_config = input_config_matching(input_device, output_config.sample_rate())?;

    let sample_rate = output_config.sample_rate() as f32;
    let output_channels = output_config.channels() as usize;
    engine.prepare(sample_rate, block_size);

    log::info!(
        "Output: {} Hz, {} channels, {:?}; input: {} Hz, {} channels, {:?}",
        output_config.sample_rate(),
        output_channels,
        output_config.sample_format(),
        input_config.sample_rate(),
        input_config.channels(),
        input_config.sample_format(),
    );

    // About one second of stereo frames between the two callbacks
    let (frame_tx, frame_rx) = bounded::<[f32; 2]>(sample_rate as usize);

    let input = match input_config.sample_format() {
        cpal::SampleFormat::F32 => build_input::<f32>(input_device, &input_config.into(), frame_tx)?,
        cpal::SampleFormat::I16 => build_input::<i16>(input_device, &input_config.into(), frame_tx)?,
        cpal::SampleFormat::U16 => build_input::<u16>(input_device, &input_config.into(), frame_tx)?,
        format => return Err(HostError::UnsupportedFormat(format)),
    };

    let output = match output_config.sample_format() {
        cpal::SampleFormat::F32 => {
            build_output::<f32>(output_device, &output_config.into(), engine, frame_rx, meter_tx)?
        }
        cpal::SampleFormat::I16 => {
            build_output::<i16>(output_device, &output_config.into(), engine, frame_rx, meter_tx)?
        }
        cpal::SampleFormat::U16 => {
            build_output::<u16>(output_device, &output_config.into(), engine, frame_rx, meter_tx)?
        }
        format => return Err(HostError::UnsupportedFormat(format)),
    };

    input.play()?;
    output.play()?;

    Ok(AudioStreams {
        _input: input,
        _output: output,
        sample_rate,
        output_channels,
    })
}

/// Input config at `sample_rate` when the device supports it
fn input_config_matching(
    device: &cpal::Device,
    sample_rate: cpal::SampleRate,
) -> Result<cpal::SupportedStreamConfig, HostError> {
    let default = device.default_input_config()?;
    if default.sample_rate() == sample_rate {
        return Ok(default);
    }

    let matching = device.supported_input_configs()?.find(|range| {
        range.min_sample_rate() <= sample_rate && sample_rate <= range.max_sample_rate()
    });

    match matching {
        Some(range) => Ok(range.with_sample_rate(sample_rate)),
        None => {
            log::warn!(
                "Input device cannot run at {} Hz, using {} Hz",
                sample_rate,
                default.sample_rate()
            );
            Ok(default)
        }
    }
}

fn build_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    frame_tx: Sender<[f32; 2]>,
) -> Result<cpal::Stream, HostError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            push_input_frames(data, channels, &frame_tx);
        },
        |err| log::error!("Audio input stream error: {}", err),
        None,
    )?;

    Ok(stream)
}

fn build_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: ReverbEngine,
    frame_rx: Receiver<[f32; 2]>,
    meter_tx: Sender<MeterSnapshot>,
) -> Result<cpal::Stream, HostError>
where
    T: SizedSample + FromSample<f32>,
{
    let device_channels = config.channels as usize;
    let engine_channels = device_channels.min(2);
    let meter_interval = (config.sample_rate as f32 / METER_RATE_HZ) as usize;

    // Pre-allocate buffer for processing
    let mut temp_buffer = vec![0.0f32; 4096 * engine_channels];
    let mut frame_counter = 0usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let frames = data.len() / device_channels;
            let len = frames * engine_channels;

            // Ensure temp buffer is large enough
            if temp_buffer.len() < len {
                temp_buffer.resize(len, 0.0);
            }

            let block = &mut temp_buffer[..len];
            pull_input_frames(&frame_rx, block, engine_channels);
            engine.process(block, engine_channels);
            write_output(data, device_channels, block, engine_channels);

            // Periodically send meters to UI
            frame_counter += frames;
            if frame_counter >= meter_interval {
                let _ = meter_tx.try_send(engine.take_meters());
                frame_counter = 0;
            }
        },
        |err| log::error!("Audio output stream error: {}", err),
        None,
    )?;

    Ok(stream)
}

/// Send the first two channels of each frame; mono is duplicated
fn push_input_frames<T>(data: &[T], channels: usize, frame_tx: &Sender<[f32; 2]>)
where
    T: Sample,
    f32: FromSample<T>,
{
    if channels == 0 {
        return;
    }
    for frame in data.chunks_exact(channels) {
        let left: f32 = frame[0].to_sample();
        let right: f32 = frame.get(1).map_or(left, |s| s.to_sample());
        // Full channel means the output side stalled; drop rather than block
        let _ = frame_tx.try_send([left, right]);
    }
}

/// Fill an interleaved block from the input channel, silence on underrun
fn pull_input_frames(frame_rx: &Receiver<[f32; 2]>, block: &mut [f32], channels: usize) {
    for frame in block.chunks_exact_mut(channels) {
        let [left, right] = frame_rx.try_recv().unwrap_or([0.0, 0.0]);
        frame[0] = left;
        if channels > 1 {
            frame[1] = right;
        }
    }
}

/// Copy processed audio into the device buffer, silencing extra channels
fn write_output<T>(data: &mut [T], device_channels: usize, block: &[f32], engine_channels: usize)
where
    T: Sample + FromSample<f32>,
{
    for (out, frame) in data
        .chunks_exact_mut(device_channels)
        .zip(block.chunks_exact(engine_channels))
    {
        for (ch, sample) in out.iter_mut().enumerate() {
            *sample = match frame.get(ch) {
                Some(&value) => T::from_sample(value),
                None => T::EQUILIBRIUM,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_device() {
        let devices = vec!["MacBook Pro Microphone".to_string(), "BlackHole 2ch".to_string()];
        assert_eq!(find_device(&devices, "0", DeviceKind::Input).unwrap(), 0);
        assert_eq!(find_device(&devices, "blackhole", DeviceKind::Input).unwrap(), 1);
        assert!(matches!(
            find_device(&devices, "7", DeviceKind::Output),
            Err(HostError::IndexOutOfRange { index: 7, count: 2, .. })
        ));
        assert!(matches!(
            find_device(&devices, "scarlett", DeviceKind::Output),
            Err(HostError::DeviceNotFound { .. })
        ));
    }

    #[test]
    fn test_error_messages() {
        let err = HostError::DeviceNotFound {
            kind: DeviceKind::Output,
            search: "foo".to_string(),
        };
        assert_eq!(err.to_string(), "audio output device 'foo' not found");
        assert_eq!(
            HostError::NoDevices(DeviceKind::Input).to_string(),
            "no audio input devices found"
        );
    }

    #[test]
    fn test_input_frames_roundtrip_through_channel() {
        let (tx, rx) = bounded(16);

        // Mono input duplicates, extra channels are dropped
        push_input_frames(&[0.5f32, -0.25], 1, &tx);
        push_input_frames(&[0.1f32, 0.2, 0.9], 3, &tx);

        let mut block = vec![1.0f32; 8];
        pull_input_frames(&rx, &mut block, 2);
        assert_eq!(block, vec![0.5, 0.5, -0.25, -0.25, 0.1, 0.2, 0.0, 0.0]);
    }

    #[test]
    fn test_input_drops_when_full() {
        let (tx, rx) = bounded(2);
        push_input_frames(&[0.1f32, 0.2, 0.3, 0.4], 1, &tx);
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn test_write_output_silences_extra_channels() {
        let block = [0.5f32, -0.5, 0.25, -0.25];
        let mut data = [9.0f32; 8];
        write_output(&mut data, 4, &block, 2);
        assert_eq!(data, [0.5, -0.5, 0.0, 0.0, 0.25, -0.25, 0.0, 0.0]);
    }

    #[test]
    fn test_write_output_converts_format() {
        let block = [0.5f32, 0.0];
        let mut data = [0i16; 2];
        write_output(&mut data, 2, &block, 2);
        assert!(data[0] > 16000);
        assert_eq!(data[1], 0);

        let mut data = [0u16; 1];
        write_output(&mut data, 1, &[0.0f32], 1);
        assert_eq!(data, [u16::EQUILIBRIUM]);
    }
}
