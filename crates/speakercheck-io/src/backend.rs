//! Audio backend seam.
//!
//! A measurement only needs two things from the platform: a playback stream
//! pulling interleaved frames and a capture stream pushing them.
//! [`AudioBackend`] is that seam. [`CpalBackend`](crate::CpalBackend) talks to
//! real devices, [`LoopbackBackend`](crate::LoopbackBackend) wires playback
//! into capture in-process.
//!
//! Callbacks are boxed so the trait stays object-safe and a
//! [`MeasurementContext`](crate::MeasurementContext) can hold any backend as
//! `Box<dyn AudioBackend>`.

use crate::{AudioDevice, Result};
use speakercheck_config::MeasurementSettings;

/// Parameters of one playback or capture stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStreamConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per callback the backend should aim for.
    pub buffer_size: u32,
    /// Interleaved channels.
    pub channels: u16,
    /// Device name to match, or `None` for the host default.
    pub device_name: Option<String>,
}

impl BackendStreamConfig {
    /// Playback stream described by `settings`.
    pub fn playback(settings: &MeasurementSettings) -> Self {
        Self {
            sample_rate: settings.sample_rate,
            buffer_size: settings.buffer_size,
            channels: settings.output_channels.max(1),
            device_name: settings.output_device.clone(),
        }
    }

    /// Capture stream described by `settings`.
    pub fn capture(settings: &MeasurementSettings) -> Self {
        Self {
            sample_rate: settings.sample_rate,
            buffer_size: settings.buffer_size,
            channels: settings.input_channels.max(1),
            device_name: settings.input_device.clone(),
        }
    }
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self::playback(&MeasurementSettings::default())
    }
}

/// Keeps a stream running; dropping it stops the stream.
pub struct StreamHandle {
    _stream: Box<dyn Send>,
}

impl StreamHandle {
    /// Own a backend-specific stream object until the handle drops.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _stream: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Fills one block of interleaved playback frames. Runs on the audio thread.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Receives one block of interleaved captured frames. Runs on the audio thread.
pub type InputCallback = Box<dyn FnMut(&[f32]) + Send>;

/// Receives stream errors reported after the stream started.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Source of playback and capture streams.
pub trait AudioBackend: Send {
    /// Short backend name for logs and the CLI ("cpal", "loopback").
    fn name(&self) -> &str;

    /// Devices this backend can open.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// Device used for playback when none is named.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// Device used for capture when none is named.
    fn default_input_device(&self) -> Result<Option<AudioDevice>>;

    /// Open and start a playback stream.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Open and start a capture stream.
    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        callback: InputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Rate the backend will really run `config` at.
    ///
    /// Excitations are rendered at this rate. Defaults to the requested rate.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}
