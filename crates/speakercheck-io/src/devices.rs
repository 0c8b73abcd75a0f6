//! Audio device enumeration via cpal.

use crate::Result;
use cpal::Device;
use cpal::traits::{DeviceTrait, HostTrait};

/// Reported when a device has no default configuration.
const FALLBACK_SAMPLE_RATE: u32 = 48000;

/// Device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// A playback or capture device as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Name as reported by the host; `--input`/`--output` match against it.
    pub name: String,
    /// Can capture (microphone side).
    pub is_input: bool,
    /// Can play (speaker side).
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
}

impl AudioDevice {
    /// Short direction label: "in", "out" or "in/out".
    pub fn direction(&self) -> &'static str {
        match (self.is_input, self.is_output) {
            (true, true) => "in/out",
            (true, false) => "in",
            (false, true) => "out",
            (false, false) => "-",
        }
    }

    /// Describe `device`, probing both directions. `None` if it has no name.
    fn probe(device: &Device) -> Option<Self> {
        let name = device_name(device).ok()?;
        let input_rate = device.default_input_config().map(|c| c.sample_rate()).ok();
        let output_rate = device.default_output_config().map(|c| c.sample_rate()).ok();
        Some(Self {
            name,
            is_input: input_rate.is_some(),
            is_output: output_rate.is_some(),
            default_sample_rate: input_rate.or(output_rate).unwrap_or(FALLBACK_SAMPLE_RATE),
        })
    }
}

/// Every input and output device of the default host, each listed once.
///
/// Enumeration errors from the host are treated as "no devices".
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let inputs = host.input_devices().into_iter().flatten();
    let outputs = host.output_devices().into_iter().flatten();

    let mut devices: Vec<AudioDevice> = Vec::new();
    for device in inputs.chain(outputs).filter_map(|d| AudioDevice::probe(&d)) {
        if !devices.iter().any(|known| known.name == device.name) {
            devices.push(device);
        }
    }

    tracing::debug!(count = devices.len(), "enumerated audio devices");
    Ok(devices)
}

/// Default (input, output) devices of the default host.
pub fn default_device() -> Result<(Option<AudioDevice>, Option<AudioDevice>)> {
    let host = cpal::default_host();
    let input = host
        .default_input_device()
        .and_then(|d| AudioDevice::probe(&d));
    let output = host
        .default_output_device()
        .and_then(|d| AudioDevice::probe(&d));
    Ok((input, output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_never_fails() {
        // Device availability depends on the machine.
        let devices = list_devices().unwrap();
        let mut names: Vec<_> = devices.iter().map(|d| d.name.as_str()).collect();
        names.dedup();
        assert_eq!(names.len(), devices.len());
    }

    #[test]
    fn direction_labels() {
        let mut device = AudioDevice {
            name: "Measurement mic".to_string(),
            is_input: true,
            is_output: false,
            default_sample_rate: 44100,
        };
        assert_eq!(device.direction(), "in");
        device.is_output = true;
        assert_eq!(device.direction(), "in/out");
        device.is_input = false;
        assert_eq!(device.direction(), "out");
    }
}
