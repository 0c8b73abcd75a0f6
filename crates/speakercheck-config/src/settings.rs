//! Measurement settings loaded from TOML.

use serde::{Deserialize, Serialize};
use speakercheck_analysis::{DEFAULT_RESOLUTION, SweepSpec};
use std::path::Path;

use crate::error::{ConfigError, Result};

/// Parameters shared by signal generation, capture and analysis.
///
/// The single [`SweepSpec`] here is what both the generator and the response
/// builder use, so a measurement can never analyse a different sweep from
/// the one it played.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// buffer_size = 512
/// input_channels = 1
/// output_channels = 2
/// amplitude = 0.5
/// tail_secs = 1.0
/// tone_frequency = 1000.0
/// tone_duration_secs = 3.0
/// resolution = 200
/// input_device = "USB Microphone"
///
/// [sweep]
/// start_freq = 20.0
/// end_freq = 20000.0
/// duration_secs = 10.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementSettings {
    /// Stream sample rate in Hz.
    pub sample_rate: u32,
    /// Audio buffer size in frames.
    pub buffer_size: u32,
    /// Channels requested from the capture device; channel 0 is analysed.
    pub input_channels: u16,
    /// Channels of the playback stream; the excitation is panned across the first two.
    pub output_channels: u16,
    /// Peak output amplitude of the excitation (0..=1).
    pub amplitude: f32,
    /// Extra recording time after playback ends, in seconds.
    pub tail_secs: f32,
    /// Sweep played by sweep tests.
    pub sweep: SweepSpec,
    /// Frequency of tone tests in Hz.
    pub tone_frequency: f32,
    /// Length of tone tests in seconds.
    pub tone_duration_secs: f32,
    /// Points in a sweep response.
    pub resolution: usize,
    /// Capture device name; default device if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,
    /// Playback device name; default device if unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
}

impl Default for MeasurementSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            input_channels: 1,
            output_channels: 2,
            amplitude: 0.5,
            tail_secs: 1.0,
            sweep: SweepSpec::default(),
            tone_frequency: 1000.0,
            tone_duration_secs: 3.0,
            resolution: DEFAULT_RESOLUTION,
            input_device: None,
            output_device: None,
        }
    }
}

impl MeasurementSettings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load settings from `path`, or defaults if the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let settings = Self::load(path)?;
            tracing::debug!(path = %path.display(), "loaded measurement settings");
            Ok(settings)
        } else {
            tracing::debug!(path = %path.display(), "no settings file; using defaults");
            Ok(Self::default())
        }
    }

    /// Parse settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        std::fs::write(path, self.to_toml()?).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
