//! [`AudioBackend`] over cpal's default host (ALSA, CoreAudio, WASAPI).

use crate::backend::{
    AudioBackend, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback, StreamHandle,
};
use crate::devices::device_name;
use crate::{AudioDevice, Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host};

/// Real-device backend.
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Backend on the platform's default host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }

    /// First device whose name contains `search` (case-insensitive), or the
    /// host default when `search` is `None`.
    fn find_device(&self, search: Option<&str>, is_input: bool) -> Result<Device> {
        let kind = if is_input { "input" } else { "output" };
        let Some(search) = search else {
            let default = if is_input {
                self.host.default_input_device()
            } else {
                self.host.default_output_device()
            };
            return default.ok_or(Error::NoDevice);
        };

        let devices: Vec<Device> = if is_input {
            self.host.input_devices().map(Iterator::collect)
        } else {
            self.host.output_devices().map(Iterator::collect)
        }
        .map_err(|e| Error::Stream(e.to_string()))?;

        let needle = search.to_lowercase();
        devices
            .into_iter()
            .find(|device| {
                device_name(device).is_ok_and(|name| name.to_lowercase().contains(&needle))
            })
            .ok_or_else(|| Error::DeviceNotFound(format!("no {kind} device matching '{search}'")))
    }

    fn stream_config(config: &BackendStreamConfig) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        }
    }

    fn start(
        stream: cpal::Stream,
        kind: &str,
        config: &BackendStreamConfig,
    ) -> Result<StreamHandle> {
        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            kind,
            channels = config.channels,
            sample_rate = config.sample_rate,
            device = config.device_name.as_deref().unwrap_or("default"),
            "stream started"
        );
        Ok(StreamHandle::new(stream))
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<AudioDevice>> {
        crate::devices::list_devices()
    }

    fn default_output_device(&self) -> Result<Option<AudioDevice>> {
        Ok(crate::devices::default_device()?.1)
    }

    fn default_input_device(&self) -> Result<Option<AudioDevice>> {
        Ok(crate::devices::default_device()?.0)
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_device(config.device_name.as_deref(), false)?;
        let stream = device
            .build_output_stream(
                &Self::stream_config(config),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| callback(data),
                move |err| error_callback(&err.to_string()),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;
        Self::start(stream, "playback", config)
    }

    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: InputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_device(config.device_name.as_deref(), true)?;
        let stream = device
            .build_input_stream(
                &Self::stream_config(config),
                move |data: &[f32], _: &cpal::InputCallbackInfo| callback(data),
                move |err| error_callback(&err.to_string()),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;
        Self::start(stream, "capture", config)
    }

    /// The requested rate if the playback device supports it at the
    /// requested channel count, otherwise the device's default rate.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        let Ok(device) = self.find_device(config.device_name.as_deref(), false) else {
            return config.sample_rate;
        };
        let supported = device.supported_output_configs().is_ok_and(|mut ranges| {
            ranges.any(|range| {
                range.channels() == config.channels
                    && range.min_sample_rate() <= config.sample_rate
                    && config.sample_rate <= range.max_sample_rate()
            })
        });
        if supported {
            return config.sample_rate;
        }
        device
            .default_output_config()
            .map(|c| c.sample_rate())
            .unwrap_or(config.sample_rate)
    }
}
