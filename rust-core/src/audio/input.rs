//! Audio input capture
//!
//! The capture device is reached through `CaptureBackend`, which opens a
//! stream that invokes a callback with each block of mono samples. The cpal
//! backend captures from a microphone or line-in.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, SampleRate, Stream, StreamConfig, SupportedBufferSize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio input device found")]
    NoDevice,

    #[error("No audio input device named '{0}'")]
    DeviceNotFound(String),

    #[error("Failed to get device name: {0}")]
    DeviceName(String),

    #[error("Failed to query supported configs: {0}")]
    SupportedConfigs(String),

    #[error("Device '{device}' does not support {sample_rate} Hz f32 input")]
    UnsupportedSampleRate { device: String, sample_rate: u32 },

    #[error("Failed to build stream: {0}")]
    BuildStream(String),

    #[error("Failed to play stream: {0}")]
    PlayStream(String),

    #[error("Failed to pause stream: {0}")]
    PauseStream(String),

    #[error("Failed to spawn {0} thread: {1}")]
    SpawnThread(&'static str, String),
}

/// Callback invoked on the device thread with one block of mono samples
pub type BlockCallback = Box<dyn FnMut(&[f32]) + Send + 'static>;

/// Parameters requested from the capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    pub sample_rate: u32,
    pub block_size: usize,
}

/// Audio input device information
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// An open input stream
///
/// Dropping the stream closes it.
pub trait InputStream {
    /// Start delivering blocks
    fn play(&self) -> Result<(), AudioError>;

    /// Stop delivering blocks
    fn pause(&self) -> Result<(), AudioError>;
}

/// Capture-device capability
pub trait CaptureBackend {
    /// Open a stream that calls `callback` once per captured block
    fn open(
        &self,
        params: StreamParams,
        callback: BlockCallback,
    ) -> Result<Box<dyn InputStream>, AudioError>;
}

/// Capture from a cpal input device
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    device_name: Option<String>,
}

impl CpalBackend {
    /// Capture from the host's default input device
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture from the input device with the given name
    pub fn with_device_name(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    fn find_device(&self) -> Result<Device, AudioError> {
        let host = cpal::default_host();

        match &self.device_name {
            None => host.default_input_device().ok_or(AudioError::NoDevice),
            Some(wanted) => {
                let mut devices = host
                    .input_devices()
                    .map_err(|e| AudioError::DeviceName(e.to_string()))?;

                devices
                    .find(|d| d.name().map(|n| &n == wanted).unwrap_or(false))
                    .ok_or_else(|| AudioError::DeviceNotFound(wanted.clone()))
            }
        }
    }
}

/// Pick a channel count and buffer size the device supports at `params`,
/// preferring mono
fn negotiate_config(
    device: &Device,
    device_name: &str,
    params: StreamParams,
) -> Result<StreamConfig, AudioError> {
    let rate = SampleRate(params.sample_rate);

    let mut candidates: Vec<_> = device
        .supported_input_configs()
        .map_err(|e| AudioError::SupportedConfigs(e.to_string()))?
        .filter(|range| {
            range.sample_format() == SampleFormat::F32
                && range.min_sample_rate() <= rate
                && rate <= range.max_sample_rate()
        })
        .collect();

    candidates.sort_by_key(|range| range.channels());

    let range = candidates
        .first()
        .ok_or_else(|| AudioError::UnsupportedSampleRate {
            device: device_name.to_string(),
            sample_rate: params.sample_rate,
        })?;

    let block = params.block_size as u32;
    let buffer_size = match range.buffer_size() {
        SupportedBufferSize::Range { min, max } if *min <= block && block <= *max => {
            BufferSize::Fixed(block)
        }
        _ => BufferSize::Default,
    };

    Ok(StreamConfig {
        channels: range.channels(),
        sample_rate: rate,
        buffer_size,
    })
}

impl CaptureBackend for CpalBackend {
    fn open(
        &self,
        params: StreamParams,
        mut callback: BlockCallback,
    ) -> Result<Box<dyn InputStream>, AudioError> {
        let device = self.find_device()?;
        let name = device
            .name()
            .map_err(|e| AudioError::DeviceName(e.to_string()))?;

        let config = negotiate_config(&device, &name, params)?;
        let channels = config.channels as usize;

        if channels > 1 {
            log::info!("{} has no mono input, downmixing {} channels", name, channels);
        }
        if matches!(config.buffer_size, BufferSize::Default) {
            log::debug!(
                "{} does not accept {}-sample blocks, using its default buffer size",
                name,
                params.block_size
            );
        }

        let mut mono = Vec::with_capacity(params.block_size);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if channels == 1 {
                        callback(data);
                    } else {
                        mono.clear();
                        mono.extend(
                            data.chunks(channels)
                                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32),
                        );
                        callback(&mono);
                    }
                },
                move |err| {
                    log::error!("Audio input error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::BuildStream(e.to_string()))?;

        log::info!(
            "Opened input '{}' at {} Hz, {} channel(s)",
            name,
            params.sample_rate,
            channels
        );

        Ok(Box::new(CpalStream { stream }))
    }
}

struct CpalStream {
    stream: Stream,
}

impl InputStream for CpalStream {
    fn play(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::PauseStream(e.to_string()))
    }
}

/// Input devices that offer a usable default configuration
///
/// Devices whose name or default config cannot be queried are skipped.
pub fn list_input_devices() -> Result<Vec<AudioDeviceInfo>, AudioError> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| AudioError::DeviceName(e.to_string()))?;

    Ok(devices
        .filter_map(|device| {
            let name = device.name().ok()?;
            match device.default_input_config() {
                Ok(config) if config.channels() > 0 && config.sample_rate().0 > 0 => {
                    Some(AudioDeviceInfo {
                        name,
                        sample_rate: config.sample_rate().0,
                        channels: config.channels(),
                    })
                }
                Ok(_) => None,
                Err(e) => {
                    log::debug!("Skipping input device {}: {}", name, e);
                    None
                }
            }
        })
        .collect())
}
